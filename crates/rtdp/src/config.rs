//! RTDP configuration parameters.

use planner_core::{check_discount, check_positive, ConfigurationError, LinearDecay};
use serde::{Deserialize, Serialize};

/// RTDP configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtdpConfig {
    /// Discount factor applied per step, in (0, 1].
    pub gamma: f64,

    /// Number of training episodes per `run`.
    pub episodes: usize,

    /// Step cap per episode.
    pub max_steps: usize,

    /// Per-episode exploration rate. `None` means always greedy.
    pub epsilon_schedule: Option<LinearDecay>,

    /// Q-values within this distance of the maximum count as tied.
    /// 0.0 means exact equality.
    pub tie_tolerance: f64,
}

impl Default for RtdpConfig {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            episodes: 50,
            max_steps: 1_000,
            epsilon_schedule: None,
            tie_tolerance: 1e-9,
        }
    }
}

impl RtdpConfig {
    /// Create a new config with the specified number of episodes.
    pub fn with_episodes(episodes: usize) -> Self {
        Self {
            episodes,
            ..Default::default()
        }
    }

    /// Explore with a linearly decaying epsilon.
    pub fn with_epsilon_schedule(mut self, schedule: LinearDecay) -> Self {
        self.epsilon_schedule = Some(schedule);
        self
    }

    /// Epsilon held for the whole of episode `episode`.
    pub fn epsilon(&self, episode: usize) -> f64 {
        self.epsilon_schedule
            .as_ref()
            .map_or(0.0, |s| s.value(episode))
    }

    /// Reject parameters training cannot run with.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_discount(self.gamma)?;
        check_positive("episodes", self.episodes)?;
        check_positive("max_steps", self.max_steps)?;
        if let Some(schedule) = &self.epsilon_schedule {
            schedule.validate()?;
        }
        if self.tie_tolerance.is_nan() || self.tie_tolerance < 0.0 {
            return Err(ConfigurationError::parameter(
                "tie_tolerance",
                format!("{} must be non-negative", self.tie_tolerance),
            ));
        }
        Ok(())
    }
}
