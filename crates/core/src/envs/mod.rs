//! Reference environments for planner validation.
//!
//! These are used to exercise the planners end to end and by the
//! command-line driver.

pub mod gridworld;

pub use gridworld::{Cell, GridWorld, Move};
