//! MCTS node types for tree storage.
//!
//! Uses arena allocation with indices for cache locality and simpler memory management.

/// Index into the node arena.
///
/// This is a lightweight handle that references a node in the tree.
/// Using indices instead of pointers avoids Rc/RefCell overhead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Statistics for a single MCTS node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeStats {
    /// Number of backpropagation passes through this node.
    pub visits: u32,

    /// Sum of the discounted returns credited to this node.
    pub value_sum: f64,
}

impl NodeStats {
    /// Mean return (q) of this node.
    ///
    /// Returns 0.0 if the node has never been visited.
    pub fn q(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f64
        }
    }

    /// Record one backpropagated return.
    pub fn record(&mut self, ret: f64) {
        self.visits += 1;
        self.value_sum += ret;
    }
}

/// Back-reference from a child to the edge that produced it.
///
/// Non-owning: the arena owns every node and ownership runs root to children.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge<A> {
    /// Kept for path reconstruction; search itself walks recorded paths.
    #[allow(dead_code)]
    pub parent: NodeId,
    #[allow(dead_code)]
    pub action: A,
    /// Reward sampled when this edge was expanded.
    pub reward: f64,
}

/// A node in the MCTS tree.
///
/// Each node holds the state reached along its unique path from the root
/// and the statistics of the rollouts that passed through it.
#[derive(Clone, Debug)]
pub struct Node<S, A> {
    pub state: S,

    /// Edge into this node (None for root).
    pub parent: Option<Edge<A>>,

    /// Children in discovery order, at most one per action.
    pub children: Vec<(A, NodeId)>,

    pub stats: NodeStats,
}

impl<S, A: PartialEq> Node<S, A> {
    /// Create the root node.
    pub fn root(state: S) -> Self {
        Self {
            state,
            parent: None,
            children: Vec::new(),
            stats: NodeStats::default(),
        }
    }

    /// Create a node reached from `parent` via `action`.
    pub fn child(state: S, parent: NodeId, action: A, reward: f64) -> Self {
        Self {
            state,
            parent: Some(Edge {
                parent,
                action,
                reward,
            }),
            children: Vec::new(),
            stats: NodeStats::default(),
        }
    }

    /// Child reached via `action`, if already discovered.
    pub fn child_for(&self, action: &A) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(a, _)| a == action)
            .map(|(_, id)| *id)
    }

    /// Reward on the edge into this node (0 for the root).
    pub fn edge_reward(&self) -> f64 {
        self.parent.as_ref().map_or(0.0, |e| e.reward)
    }
}
