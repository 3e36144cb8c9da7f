//! Planner Core - MDP abstractions and common types
//!
//! This crate provides the [`Mdp`] trait that the MCTS and RTDP planners
//! consume, plus the pieces both of them share.
//!
//! # Types
//!
//! - [`Mdp`] - Trait for environment models
//! - [`Transition`] - One weighted outcome of an action
//! - [`LinearDecay`] - Exploration schedule
//! - [`PlanningError`] / [`ConfigurationError`] - Failure modes

pub mod envs;
mod error;
mod mdp;
mod schedule;
mod types;

pub use error::{ConfigurationError, PlanningError, Result};
pub use mdp::{sample_next_state_and_reward, Mdp};
pub use schedule::LinearDecay;
pub use types::{
    check_discount, check_positive, validate_transitions, Heuristic, Transition,
    PROBABILITY_SUM_TOLERANCE,
};

/// Seed of the random source planners use when none is supplied.
pub const DEFAULT_SEED: u64 = 0;
