//! Monte Carlo Tree Search over a generic MDP.
//!
//! This crate provides a UCT planner that can be used with any environment
//! implementing the `planner_core::Mdp` trait.
//!
//! # Features
//!
//! - **Generic**: Works with any `Mdp` implementation
//! - **UCT Selection**: Upper confidence bounds over discovered siblings
//! - **Stochastic outcomes**: Each expansion samples one outcome of the action
//! - **Reproducible**: A single seeded random source drives the whole search
//!
//! # Example
//!
//! ```
//! use planner_core::{envs::GridWorld, Mdp};
//! use planner_mcts::{Mcts, MctsConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let world = GridWorld::classic();
//! let start = world.initial_state();
//!
//! let config = MctsConfig::with_rollouts(100);
//! let rng = ChaCha8Rng::seed_from_u64(42);
//! let mut mcts = Mcts::with_rng(&world, config, rng);
//!
//! let result = mcts.search_with_stats(&start).expect("start has actions");
//! println!("Best action: {:?}", result.best_action);
//! println!("Root visits: {}", result.total_visits());
//! ```

pub mod config;
mod node;
pub mod search;
mod tree;

pub use config::MctsConfig;
pub use node::NodeStats;
pub use search::{uct_score, Mcts, SearchResult};
