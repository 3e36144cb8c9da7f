//! Real-Time Dynamic Programming over a generic MDP.
//!
//! RTDP learns a state-value function by running simulated episodes and
//! performing Bellman backups only on the states those episodes visit.
//! Unseen states are valued lazily from an optional heuristic.
//!
//! # Example
//!
//! ```
//! use planner_core::{envs::GridWorld, LinearDecay, Mdp};
//! use planner_rtdp::{Rtdp, RtdpConfig};
//!
//! let world = GridWorld::classic();
//! let config = RtdpConfig::with_episodes(20)
//!     .with_epsilon_schedule(LinearDecay::new(0.3, 0.0, 15));
//!
//! let mut rtdp = Rtdp::new(&world, config);
//! let summaries = rtdp.run().expect("every non-terminal cell has moves");
//! assert_eq!(summaries.len(), 20);
//!
//! let start = world.initial_state();
//! println!("V(start) = {:.3}", rtdp.value(&start));
//! ```

pub mod config;
pub mod planner;
mod value_table;

pub use config::RtdpConfig;
pub use planner::{EpisodeSummary, Rtdp};
pub use value_table::ValueTable;
