//! Stochastic grid world.
//!
//! The agent moves between cells of a rectangular grid. Each move goes in the
//! intended direction with probability `1 - slip` and slips to one of the two
//! perpendicular directions otherwise. Bumping into a wall or the edge leaves
//! the agent in place. Terminal cells pay a one-off reward on entry.

use crate::{Mdp, Transition};
use std::fmt;

/// A grid cell, row 0 at the top.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Movement action.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// The two directions at right angles to this one.
    pub fn perpendicular(self) -> [Move; 2] {
        match self {
            Move::Up | Move::Down => [Move::Left, Move::Right],
            Move::Left | Move::Right => [Move::Up, Move::Down],
        }
    }

    /// Arrow glyph for policy printouts.
    pub fn arrow(self) -> char {
        match self {
            Move::Up => '^',
            Move::Down => 'v',
            Move::Left => '<',
            Move::Right => '>',
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arrow())
    }
}

/// Grid world environment.
#[derive(Clone, Debug)]
pub struct GridWorld {
    rows: usize,
    cols: usize,
    start: Cell,
    walls: Vec<Cell>,
    terminals: Vec<(Cell, f64)>,
    step_reward: f64,
    slip: f64,
}

impl GridWorld {
    /// Create an open, deterministic grid with no terminals and zero step reward.
    pub fn new(rows: usize, cols: usize, start: Cell) -> Self {
        Self {
            rows,
            cols,
            start,
            walls: Vec::new(),
            terminals: Vec::new(),
            step_reward: 0.0,
            slip: 0.0,
        }
    }

    /// The 4x3 world from Russell & Norvig: goal +1 top right, pit -1 below
    /// it, one wall, -0.04 per step and 20% slip.
    pub fn classic() -> Self {
        Self::new(3, 4, Cell::new(2, 0))
            .with_wall(Cell::new(1, 1))
            .with_terminal(Cell::new(0, 3), 1.0)
            .with_terminal(Cell::new(1, 3), -1.0)
            .with_step_reward(-0.04)
            .with_slip(0.2)
    }

    pub fn with_wall(mut self, cell: Cell) -> Self {
        self.walls.push(cell);
        self
    }

    pub fn with_terminal(mut self, cell: Cell, reward: f64) -> Self {
        self.terminals.push((cell, reward));
        self
    }

    pub fn with_step_reward(mut self, reward: f64) -> Self {
        self.step_reward = reward;
        self
    }

    /// Total probability of slipping sideways, split evenly between the two
    /// perpendicular directions.
    pub fn with_slip(mut self, slip: f64) -> Self {
        self.slip = slip;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_wall(&self, cell: Cell) -> bool {
        self.walls.contains(&cell)
    }

    /// Entry reward of a terminal cell, if `cell` is one.
    pub fn terminal_reward(&self, cell: Cell) -> Option<f64> {
        self.terminals
            .iter()
            .find(|(c, _)| *c == cell)
            .map(|(_, r)| *r)
    }

    /// All non-wall cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.cols).map(move |col| Cell::new(row, col)))
            .filter(move |c| !self.is_wall(*c))
    }

    /// Where `mv` leads from `cell`, ignoring slip.
    pub fn destination(&self, cell: Cell, mv: Move) -> Cell {
        let next = match mv {
            Move::Up if cell.row > 0 => Cell::new(cell.row - 1, cell.col),
            Move::Down if cell.row + 1 < self.rows => Cell::new(cell.row + 1, cell.col),
            Move::Left if cell.col > 0 => Cell::new(cell.row, cell.col - 1),
            Move::Right if cell.col + 1 < self.cols => Cell::new(cell.row, cell.col + 1),
            _ => cell,
        };
        if self.is_wall(next) {
            cell
        } else {
            next
        }
    }

    fn outcome(&self, cell: Cell, mv: Move, probability: f64) -> Transition<Cell> {
        let next = self.destination(cell, mv);
        let reward = self.step_reward + self.terminal_reward(next).unwrap_or(0.0);
        Transition::new(probability, reward, next)
    }

    /// Render one string per cell into a grid, `#` marking walls.
    pub fn render(&self, mut label: impl FnMut(Cell) -> String) -> String {
        let mut out = String::new();
        for row in 0..self.rows {
            let line: Vec<String> = (0..self.cols)
                .map(|col| {
                    let cell = Cell::new(row, col);
                    let text = if self.is_wall(cell) {
                        "#".to_string()
                    } else {
                        label(cell)
                    };
                    format!("{text:>7}")
                })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

impl Mdp for GridWorld {
    type State = Cell;
    type Action = Move;

    fn initial_state(&self) -> Cell {
        self.start
    }

    fn actions(&self, state: &Cell) -> Vec<Move> {
        if self.is_terminal(state) {
            Vec::new()
        } else {
            Move::ALL.to_vec()
        }
    }

    fn transitions(&self, state: &Cell, action: &Move) -> Vec<Transition<Cell>> {
        let mut out = vec![self.outcome(*state, *action, 1.0 - self.slip)];
        if self.slip > 0.0 {
            for side in action.perpendicular() {
                out.push(self.outcome(*state, side, self.slip / 2.0));
            }
        }
        out
    }

    fn is_terminal(&self, state: &Cell) -> bool {
        self.terminal_reward(*state).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_transitions;

    #[test]
    fn test_classic_layout() {
        let world = GridWorld::classic();
        assert_eq!(world.initial_state(), Cell::new(2, 0));
        assert!(world.is_terminal(&Cell::new(0, 3)));
        assert!(world.is_terminal(&Cell::new(1, 3)));
        assert!(!world.is_terminal(&Cell::new(0, 0)));
        assert_eq!(world.cells().count(), 11);
    }

    #[test]
    fn test_terminal_has_no_actions() {
        let world = GridWorld::classic();
        assert!(world.actions(&Cell::new(0, 3)).is_empty());
        assert_eq!(world.actions(&Cell::new(0, 0)).len(), 4);
    }

    #[test]
    fn test_walls_and_edges_block() {
        let world = GridWorld::classic();
        // Wall at (1, 1)
        assert_eq!(world.destination(Cell::new(1, 0), Move::Right), Cell::new(1, 0));
        // Top edge
        assert_eq!(world.destination(Cell::new(0, 0), Move::Up), Cell::new(0, 0));
        assert_eq!(world.destination(Cell::new(0, 0), Move::Right), Cell::new(0, 1));
    }

    #[test]
    fn test_transitions_are_distributions() {
        let world = GridWorld::classic();
        for cell in world.cells() {
            for mv in world.actions(&cell) {
                let ts = world.transitions(&cell, &mv);
                assert_eq!(ts.len(), 3);
                assert!(validate_transitions(&ts).is_ok(), "{cell} {mv:?}");
            }
        }
    }

    #[test]
    fn test_goal_reward_on_entry() {
        let world = GridWorld::classic();
        let ts = world.transitions(&Cell::new(0, 2), &Move::Right);
        let goal = &ts[0];
        assert_eq!(goal.next_state, Cell::new(0, 3));
        assert!((goal.probability - 0.8).abs() < 1e-12);
        assert!((goal.reward - 0.96).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic_world_single_outcome() {
        let world = GridWorld::new(1, 3, Cell::new(0, 0))
            .with_terminal(Cell::new(0, 2), 5.0);
        let ts = world.transitions(&Cell::new(0, 1), &Move::Right);
        assert_eq!(ts, vec![Transition::certain(5.0, Cell::new(0, 2))]);
    }

    #[test]
    fn test_render_marks_walls() {
        let world = GridWorld::classic();
        let start = Cell::new(0, 0);
        let text = world.render(|c| if c == start { "S".into() } else { ".".into() });
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains('#'));
        assert!(text.contains('S'));
    }
}
