//! Monte Carlo Tree Search implementation.
//!
//! Each call to [`Mcts::search`] grows a fresh tree from the given root with
//! a fixed number of rollouts. A rollout has four phases:
//!
//! 1. Selection: descend through fully expanded nodes by UCT score.
//! 2. Expansion: attach one child for a random untried action.
//! 3. Simulation: random-policy rollout from the new leaf.
//! 4. Backpropagation: credit the discounted return along the path.

use crate::{
    config::MctsConfig,
    node::{NodeId, NodeStats},
    tree::Tree,
};
use log::debug;
use planner_core::{Heuristic, Mdp, PlanningError, Result, DEFAULT_SEED};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Result of an MCTS search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult<A> {
    /// Recommended action (highest root-child visit count).
    pub best_action: A,

    /// Visit count for each discovered root action, in discovery order.
    /// Empty when the root never expanded.
    pub visit_counts: Vec<(A, u32)>,

    /// Mean return of the recommended action, if it was searched.
    pub best_q: Option<f64>,

    /// Number of nodes in the search tree, root included.
    pub tree_size: usize,
}

impl<A> SearchResult<A> {
    /// Total visits across root actions.
    pub fn total_visits(&self) -> u32 {
        self.visit_counts.iter().map(|(_, c)| *c).sum()
    }
}

/// UCT score of a child among siblings whose visits sum to `total_sibling_visits`.
///
/// score = q + c_uct * sqrt(ln(total_sibling_visits + 1) / visits)
///
/// Unvisited children score +inf, so every discovered action is tried once
/// before any sibling is revisited.
pub fn uct_score(child: &NodeStats, total_sibling_visits: u32, c_uct: f64) -> f64 {
    if child.visits == 0 {
        return f64::INFINITY;
    }
    let log_total = (total_sibling_visits as f64 + 1.0).ln();
    let exploration = (log_total / child.visits as f64).sqrt();
    child.q() + c_uct * exploration
}

/// Monte Carlo Tree Search with UCT selection.
///
/// Generic over:
/// - `M`: The environment model
/// - `R`: The random number generator, shared by expansion and rollouts
pub struct Mcts<M: Mdp, R = ChaCha8Rng> {
    mdp: M,
    config: MctsConfig,
    rng: R,
    heuristic: Option<Heuristic<M::State>>,
}

impl<M: Mdp> Mcts<M> {
    /// Create a planner with the default fixed-seed random source.
    pub fn new(mdp: M, config: MctsConfig) -> Self {
        Self::with_rng(mdp, config, ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl<M, R> Mcts<M, R>
where
    M: Mdp,
    R: Rng,
{
    /// Create a planner drawing from `rng`.
    pub fn with_rng(mdp: M, config: MctsConfig, rng: R) -> Self {
        Self {
            mdp,
            config,
            rng,
            heuristic: None,
        }
    }

    /// Attach a state-value heuristic.
    ///
    /// Rollouts are pure Monte Carlo and never consult it. It is kept so both
    /// planners can be built from the same inputs.
    pub fn with_heuristic(mut self, heuristic: impl Fn(&M::State) -> f64 + 'static) -> Self {
        self.heuristic = Some(Box::new(heuristic));
        self
    }

    pub fn heuristic(&self) -> Option<&Heuristic<M::State>> {
        self.heuristic.as_ref()
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn mdp(&self) -> &M {
        &self.mdp
    }

    /// Run the rollout budget from `root` and return the most visited action.
    ///
    /// # Errors
    /// Returns [`PlanningError::NoActions`] if the root never expanded and the
    /// environment reports no actions for it.
    pub fn search(&mut self, root: &M::State) -> Result<M::Action> {
        self.search_with_stats(root).map(|r| r.best_action)
    }

    /// Like [`Mcts::search`], also reporting root statistics.
    pub fn search_with_stats(&mut self, root: &M::State) -> Result<SearchResult<M::Action>> {
        let tree = self.build_tree(root)?;
        let root_node = tree.root();

        let visit_counts: Vec<(M::Action, u32)> = root_node
            .children
            .iter()
            .map(|(a, id)| (a.clone(), tree.get(*id).stats.visits))
            .collect();

        // First-seen wins ties.
        let mut best: Option<(&M::Action, NodeId)> = None;
        let mut best_visits = 0;
        for (action, id) in &root_node.children {
            let visits = tree.get(*id).stats.visits;
            if best.is_none() || visits > best_visits {
                best = Some((action, *id));
                best_visits = visits;
            }
        }

        let (best_action, best_q) = match best {
            Some((action, id)) => (action.clone(), Some(tree.get(id).stats.q())),
            None => {
                let fallback = self
                    .mdp
                    .actions(root)
                    .into_iter()
                    .next()
                    .ok_or_else(|| PlanningError::NoActions(format!("{root:?}")))?;
                (fallback, None)
            }
        };

        debug!(
            "mcts: {} rollouts, {} nodes, root visits {:?}, chose {:?}",
            self.config.rollouts,
            tree.len(),
            visit_counts,
            best_action
        );

        Ok(SearchResult {
            best_action,
            visit_counts,
            best_q,
            tree_size: tree.len(),
        })
    }

    /// Grow a fresh tree from `root` with the full rollout budget.
    pub(crate) fn build_tree(&mut self, root: &M::State) -> Result<Tree<M::State, M::Action>> {
        let mut tree = Tree::new(root.clone());
        for _ in 0..self.config.rollouts {
            self.rollout(&mut tree)?;
        }
        Ok(tree)
    }

    /// One select -> expand -> simulate -> backpropagate pass.
    fn rollout(&mut self, tree: &mut Tree<M::State, M::Action>) -> Result<()> {
        let mut path: Vec<NodeId> = Vec::new();
        let mut current = NodeId::ROOT;
        let mut depth = 0;

        // SELECT: descend while the node is fully expanded
        while depth < self.config.max_depth {
            let node = tree.get(current);
            if node.children.is_empty()
                || self.mdp.is_terminal(&node.state)
                || node.children.len() < self.mdp.actions(&node.state).len()
            {
                break;
            }
            current = self.select_child(tree, current);
            path.push(current);
            depth += 1;
        }

        // EXPAND: one random untried action
        let state = tree.get(current).state.clone();
        if !self.mdp.is_terminal(&state) {
            let node = tree.get(current);
            let untried: Vec<M::Action> = self
                .mdp
                .actions(&state)
                .into_iter()
                .filter(|a| node.child_for(a).is_none())
                .collect();

            if !untried.is_empty() {
                let action = untried[self.rng.gen_range(0..untried.len())].clone();
                let (next, reward) = self.mdp.sample(&state, &action, &mut self.rng)?;
                current = tree.add_child(current, action, next, reward);
                path.push(current);
                depth += 1;
            }
        }

        // SIMULATE
        let leaf = tree.get(current).state.clone();
        let budget = self.config.max_depth.saturating_sub(depth);
        let leaf_return = self.simulate(leaf, budget)?;

        self.backpropagate(tree, &path, leaf_return);
        Ok(())
    }

    /// Select the child with the highest UCT score, first-seen on ties.
    fn select_child(&self, tree: &Tree<M::State, M::Action>, node_id: NodeId) -> NodeId {
        let node = tree.get(node_id);
        let total_visits: u32 = node
            .children
            .iter()
            .map(|(_, id)| tree.get(*id).stats.visits)
            .sum();

        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for (_, child_id) in &node.children {
            let stats = &tree.get(*child_id).stats;
            let score = uct_score(stats, total_visits, self.config.c_uct);
            if best.is_none() || score > best_score {
                best_score = score;
                best = Some(*child_id);
            }
        }

        // INVARIANT: only called on nodes with at least one child
        best.expect("BUG: select_child called on node without children")
    }

    /// Random-policy rollout from `state` for at most `budget` steps.
    ///
    /// Returns the discounted reward sum, the first reward undiscounted.
    fn simulate(&mut self, mut state: M::State, budget: usize) -> Result<f64> {
        let mut total = 0.0;
        let mut discount = 1.0;

        for _ in 0..budget {
            if self.mdp.is_terminal(&state) {
                break;
            }
            let actions = self.mdp.actions(&state);
            if actions.is_empty() {
                break;
            }

            let action = &actions[self.rng.gen_range(0..actions.len())];
            let (next, reward) = self.mdp.sample(&state, action, &mut self.rng)?;
            total += discount * reward;
            discount *= self.config.gamma;
            state = next;
        }

        Ok(total)
    }

    /// Credit the leaf return along `path`, leaf first.
    ///
    /// Each level adds its edge reward and discounts what lies below it once,
    /// so a node's q estimates the value of the action that reached it.
    fn backpropagate(
        &self,
        tree: &mut Tree<M::State, M::Action>,
        path: &[NodeId],
        leaf_return: f64,
    ) {
        let mut ret = leaf_return;
        for &node_id in path.iter().rev() {
            let node = tree.get_mut(node_id);
            ret = node.edge_reward() + self.config.gamma * ret;
            node.stats.record(ret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_core::envs::{Cell, GridWorld, Move};
    use planner_core::Transition;
    use std::cell::Cell as Counter;
    use std::collections::HashSet;
    use std::rc::Rc;

    // Two arms from the start: A pays 10, B pays 0, both end the episode.
    #[derive(Clone)]
    struct TwoArms;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum ArmState {
        Start,
        Done,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Arm {
        A,
        B,
    }

    impl Mdp for TwoArms {
        type State = ArmState;
        type Action = Arm;

        fn initial_state(&self) -> ArmState {
            ArmState::Start
        }

        fn actions(&self, state: &ArmState) -> Vec<Arm> {
            match state {
                ArmState::Start => vec![Arm::A, Arm::B],
                ArmState::Done => Vec::new(),
            }
        }

        fn transitions(&self, _state: &ArmState, action: &Arm) -> Vec<Transition<ArmState>> {
            let reward = match action {
                Arm::A => 10.0,
                Arm::B => 0.0,
            };
            vec![Transition::certain(reward, ArmState::Done)]
        }

        fn is_terminal(&self, state: &ArmState) -> bool {
            *state == ArmState::Done
        }
    }

    // A non-terminal state with nothing to do.
    struct Stuck;

    impl Mdp for Stuck {
        type State = u8;
        type Action = char;

        fn initial_state(&self) -> u8 {
            0
        }

        fn actions(&self, _state: &u8) -> Vec<char> {
            Vec::new()
        }

        fn transitions(&self, _state: &u8, _action: &char) -> Vec<Transition<u8>> {
            Vec::new()
        }

        fn is_terminal(&self, _state: &u8) -> bool {
            false
        }
    }

    fn corridor() -> GridWorld {
        GridWorld::new(1, 3, Cell::new(0, 1))
            .with_terminal(Cell::new(0, 0), -1.0)
            .with_terminal(Cell::new(0, 2), 1.0)
    }

    #[test]
    fn test_two_arms_prefers_reward() {
        for seed in 0..20 {
            let rng = ChaCha8Rng::seed_from_u64(seed);
            let mut mcts = Mcts::with_rng(TwoArms, MctsConfig::with_rollouts(4), rng);
            assert_eq!(mcts.search(&ArmState::Start).unwrap(), Arm::A, "seed {seed}");
        }
    }

    #[test]
    fn test_two_arms_q_values() {
        let mut mcts = Mcts::new(TwoArms, MctsConfig::with_rollouts(10));
        let result = mcts.search_with_stats(&ArmState::Start).unwrap();
        assert_eq!(result.best_action, Arm::A);
        assert_eq!(result.best_q, Some(10.0));
        assert_eq!(result.total_visits(), 10);
        assert_eq!(result.tree_size, 3);
    }

    #[test]
    fn test_single_action_single_rollout() {
        let world = GridWorld::new(1, 2, Cell::new(0, 0))
            .with_terminal(Cell::new(0, 1), 1.0);

        struct OnlyRight(GridWorld);
        impl Mdp for OnlyRight {
            type State = Cell;
            type Action = Move;
            fn initial_state(&self) -> Cell {
                self.0.initial_state()
            }
            fn actions(&self, state: &Cell) -> Vec<Move> {
                if self.0.is_terminal(state) {
                    Vec::new()
                } else {
                    vec![Move::Right]
                }
            }
            fn transitions(&self, state: &Cell, action: &Move) -> Vec<Transition<Cell>> {
                self.0.transitions(state, action)
            }
            fn is_terminal(&self, state: &Cell) -> bool {
                self.0.is_terminal(state)
            }
        }

        let mut mcts = Mcts::new(OnlyRight(world), MctsConfig::with_rollouts(1));
        assert_eq!(mcts.search(&Cell::new(0, 0)).unwrap(), Move::Right);
    }

    #[test]
    fn test_corridor_heads_for_goal() {
        let mut mcts = Mcts::new(corridor(), MctsConfig::with_rollouts(200));
        assert_eq!(mcts.search(&Cell::new(0, 1)).unwrap(), Move::Right);
    }

    #[test]
    fn test_terminal_root_falls_back_to_first_action() {
        // Terminal but still reporting actions: no expansion happens.
        struct EndsButActs;
        impl Mdp for EndsButActs {
            type State = u8;
            type Action = char;
            fn initial_state(&self) -> u8 {
                0
            }
            fn actions(&self, _state: &u8) -> Vec<char> {
                vec!['x', 'y']
            }
            fn transitions(&self, _state: &u8, _action: &char) -> Vec<Transition<u8>> {
                vec![Transition::certain(1.0, 0)]
            }
            fn is_terminal(&self, _state: &u8) -> bool {
                true
            }
        }

        let mut mcts = Mcts::new(EndsButActs, MctsConfig::with_rollouts(8));
        let result = mcts.search_with_stats(&0).unwrap();
        assert_eq!(result.best_action, 'x');
        assert!(result.visit_counts.is_empty());
        assert_eq!(result.best_q, None);
        assert_eq!(result.tree_size, 1);
    }

    #[test]
    fn test_no_actions_is_error() {
        let mut mcts = Mcts::new(Stuck, MctsConfig::with_rollouts(3));
        assert!(matches!(mcts.search(&0), Err(PlanningError::NoActions(_))));

        let world = GridWorld::classic();
        let mut mcts = Mcts::new(&world, MctsConfig::with_rollouts(3));
        assert!(matches!(
            mcts.search(&Cell::new(0, 3)),
            Err(PlanningError::NoActions(_))
        ));
    }

    #[test]
    fn test_root_visits_equal_rollouts() {
        let world = GridWorld::classic();
        for rollouts in [1, 2, 7, 64] {
            let mut mcts = Mcts::new(&world, MctsConfig::with_rollouts(rollouts));
            let tree = mcts.build_tree(&world.initial_state()).unwrap();
            let root_visits: u32 = tree
                .root()
                .children
                .iter()
                .map(|(_, id)| tree.get(*id).stats.visits)
                .sum();
            assert_eq!(root_visits as usize, rollouts);
        }
    }

    #[test]
    fn test_tree_links_consistent() {
        let world = GridWorld::classic();
        let mut mcts = Mcts::new(&world, MctsConfig::with_rollouts(300));
        let tree = mcts.build_tree(&world.initial_state()).unwrap();

        let mut seen = HashSet::new();
        for (id, node) in tree.iter() {
            let mut actions = HashSet::new();
            for (action, child_id) in &node.children {
                assert!(actions.insert(*action), "duplicate action {action:?}");
                assert!(seen.insert(*child_id), "node {child_id:?} has two parents");

                let edge = tree.get(*child_id).parent.as_ref().unwrap();
                assert_eq!(edge.parent, id);
                assert_eq!(edge.action, *action);
            }
        }
        // Every node but the root is somebody's child.
        assert_eq!(seen.len(), tree.len() - 1);
        assert!(!seen.contains(&NodeId::ROOT));
    }

    #[test]
    fn test_visits_cover_children() {
        // A node is on every path that passes through one of its children.
        let world = GridWorld::classic();
        let mut mcts = Mcts::new(&world, MctsConfig::with_rollouts(300));
        let tree = mcts.build_tree(&world.initial_state()).unwrap();

        for (id, node) in tree.iter() {
            let child_visits: u32 = node
                .children
                .iter()
                .map(|(_, c)| tree.get(*c).stats.visits)
                .sum();
            if id != NodeId::ROOT {
                assert!(node.stats.visits >= child_visits);
                assert!(node.stats.visits >= 1);
            }
        }
    }

    #[test]
    fn test_max_depth_bounds_tree() {
        let world = GridWorld::new(1, 50, Cell::new(0, 0))
            .with_terminal(Cell::new(0, 49), 1.0);
        let config = MctsConfig {
            rollouts: 500,
            max_depth: 3,
            ..Default::default()
        };
        let mut mcts = Mcts::new(&world, config);
        let tree = mcts.build_tree(&world.initial_state()).unwrap();

        // Selection stops at depth 3, expansion may add one more level.
        for (id, _) in tree.iter() {
            let mut depth = 0;
            let mut cursor = id;
            while let Some(edge) = &tree.get(cursor).parent {
                cursor = edge.parent;
                depth += 1;
            }
            assert!(depth <= 4, "node at depth {depth}");
        }
    }

    #[test]
    fn test_select_child_prefers_unvisited() {
        let mut tree: Tree<u8, char> = Tree::new(0);
        let strong = tree.add_child(NodeId::ROOT, 'a', 1, 0.0);
        let fresh = tree.add_child(NodeId::ROOT, 'b', 2, 0.0);
        for _ in 0..5 {
            tree.get_mut(strong).stats.record(100.0);
        }

        assert_eq!(uct_score(&tree.get(fresh).stats, 5, 1.4), f64::INFINITY);
        assert!(uct_score(&tree.get(strong).stats, 5, 1.4).is_finite());

        let mcts = Mcts::new(Stuck, MctsConfig::default());
        assert_eq!(mcts.select_child(&tree, NodeId::ROOT), fresh);
    }

    #[test]
    fn test_uct_score_formula() {
        let stats = NodeStats {
            visits: 4,
            value_sum: 2.0,
        };
        let expected = 0.5 + 2.0 * ((10.0f64 + 1.0).ln() / 4.0).sqrt();
        assert!((uct_score(&stats, 10, 2.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_uct_ties_go_to_first_seen() {
        let mut tree: Tree<u8, char> = Tree::new(0);
        let first = tree.add_child(NodeId::ROOT, 'a', 1, 0.0);
        let second = tree.add_child(NodeId::ROOT, 'b', 2, 0.0);
        tree.get_mut(first).stats.record(1.0);
        tree.get_mut(second).stats.record(1.0);

        let mcts = Mcts::new(Stuck, MctsConfig::default());
        assert_eq!(mcts.select_child(&tree, NodeId::ROOT), first);
    }

    #[test]
    fn test_backpropagate_discounts_per_level() {
        let mut tree: Tree<u8, char> = Tree::new(0);
        let a = tree.add_child(NodeId::ROOT, 'a', 1, 1.0);
        let b = tree.add_child(a, 'b', 2, 2.0);

        let config = MctsConfig {
            gamma: 0.5,
            ..Default::default()
        };
        let mcts = Mcts::new(Stuck, config);
        mcts.backpropagate(&mut tree, &[a, b], 4.0);

        // b: 2 + 0.5 * 4 = 4; a: 1 + 0.5 * 4 = 3
        assert_eq!(tree.get(b).stats.value_sum, 4.0);
        assert_eq!(tree.get(a).stats.value_sum, 3.0);
        assert_eq!(tree.root().stats.visits, 0);
    }

    #[test]
    fn test_deterministic() {
        let world = GridWorld::classic();
        let run = |seed: u64| {
            let rng = ChaCha8Rng::seed_from_u64(seed);
            let mut mcts = Mcts::with_rng(&world, MctsConfig::with_rollouts(100), rng);
            mcts.search_with_stats(&world.initial_state()).unwrap()
        };

        assert_eq!(run(12345), run(12345));
    }

    #[test]
    fn test_heuristic_not_consulted() {
        let calls = Rc::new(Counter::new(0));
        let counter = Rc::clone(&calls);
        let mut mcts = Mcts::new(GridWorld::classic(), MctsConfig::with_rollouts(50))
            .with_heuristic(move |_| {
                counter.set(counter.get() + 1);
                0.0
            });

        assert!(mcts.heuristic().is_some());
        mcts.search(&Cell::new(2, 0)).unwrap();
        assert_eq!(calls.get(), 0);
    }
}
