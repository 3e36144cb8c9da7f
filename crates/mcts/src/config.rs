//! MCTS configuration parameters.
//!
//! These parameters control the behavior of the Monte Carlo Tree Search algorithm.

use planner_core::{check_discount, check_positive, ConfigurationError};
use serde::{Deserialize, Serialize};

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Discount factor applied per step, in (0, 1].
    pub gamma: f64,

    /// UCT exploration constant.
    /// Score = q + c_uct * sqrt(ln(sibling visits + 1) / visits)
    pub c_uct: f64,

    /// Number of rollouts per search call.
    pub rollouts: usize,

    /// Cap on tree depth plus random-rollout depth.
    pub max_depth: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            c_uct: 1.4,
            rollouts: 200,
            max_depth: 200,
        }
    }
}

impl MctsConfig {
    /// Create a new config with the specified number of rollouts.
    pub fn with_rollouts(rollouts: usize) -> Self {
        Self {
            rollouts,
            ..Default::default()
        }
    }

    /// Reject parameters the search cannot run with.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_discount(self.gamma)?;
        if self.c_uct.is_nan() || self.c_uct <= 0.0 {
            return Err(ConfigurationError::parameter(
                "c_uct",
                format!("{} must be positive", self.c_uct),
            ));
        }
        check_positive("rollouts", self.rollouts)?;
        check_positive("max_depth", self.max_depth)
    }
}
