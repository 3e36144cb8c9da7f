//! Planning domain types.
//!
//! - Transition: one weighted outcome of an action
//! - Heuristic: optional value seed for states never seen before

use crate::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Tolerance for transition distribution validation.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// One outcome of taking an action: with `probability`, receive `reward`
/// and move to `next_state`.
///
/// # Example
/// ```
/// use planner_core::Transition;
///
/// let t = Transition::new(0.8, -0.04, (1, 2));
/// assert_eq!(t.next_state, (1, 2));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition<S> {
    pub probability: f64,
    pub reward: f64,
    pub next_state: S,
}

impl<S> Transition<S> {
    pub fn new(probability: f64, reward: f64, next_state: S) -> Self {
        Self {
            probability,
            reward,
            next_state,
        }
    }

    /// Deterministic outcome (probability 1).
    pub fn certain(reward: f64, next_state: S) -> Self {
        Self::new(1.0, reward, next_state)
    }
}

/// Validate a transition distribution.
///
/// The planners do not call this themselves; it is meant for environment
/// constructors and tests.
///
/// # Errors
/// Returns an error if:
/// - The distribution is empty
/// - Any probability is outside [0, 1] (or NaN)
/// - Probabilities don't sum to 1.0 (±1e-6)
pub fn validate_transitions<S>(transitions: &[Transition<S>]) -> Result<(), ConfigurationError> {
    if transitions.is_empty() {
        return Err(ConfigurationError::EmptyDistribution(
            "distribution cannot be empty".to_string(),
        ));
    }

    if let Some(t) = transitions
        .iter()
        .find(|t| !(0.0..=1.0).contains(&t.probability))
    {
        return Err(ConfigurationError::InvalidProbability(t.probability));
    }

    let sum: f64 = transitions.iter().map(|t| t.probability).sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(ConfigurationError::DistributionSum(sum));
    }

    Ok(())
}

/// Value seed for states a planner has not estimated yet.
pub type Heuristic<S> = Box<dyn Fn(&S) -> f64>;

/// Check a discount factor lies in (0, 1].
pub fn check_discount(gamma: f64) -> Result<(), ConfigurationError> {
    if gamma > 0.0 && gamma <= 1.0 {
        Ok(())
    } else {
        Err(ConfigurationError::parameter(
            "gamma",
            format!("{gamma} is outside (0, 1]"),
        ))
    }
}

/// Check a count-like parameter is non-zero.
pub fn check_positive(name: &'static str, value: usize) -> Result<(), ConfigurationError> {
    if value == 0 {
        Err(ConfigurationError::parameter(name, "must be positive"))
    } else {
        Ok(())
    }
}
