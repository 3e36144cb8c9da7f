//! Exploration schedules.

use crate::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Linear interpolation from `start` to `end` over `steps` steps.
///
/// Clamped outside that range: `start` at or before step 0, `end` at or after
/// `steps`.
///
/// # Example
/// ```
/// use planner_core::LinearDecay;
///
/// let decay = LinearDecay::new(1.0, 0.0, 10);
/// assert_eq!(decay.value(5), 0.5);
/// assert_eq!(decay.value(20), 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearDecay {
    pub start: f64,
    pub end: f64,
    pub steps: usize,
}

impl LinearDecay {
    pub fn new(start: f64, end: f64, steps: usize) -> Self {
        Self { start, end, steps }
    }

    /// Value at step `t`.
    pub fn value(&self, t: usize) -> f64 {
        if t == 0 {
            return self.start;
        }
        if t >= self.steps {
            return self.end;
        }
        let frac = t as f64 / self.steps as f64;
        self.start + frac * (self.end - self.start)
    }

    /// Check both endpoints are usable as probabilities.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let endpoints = [
            ("epsilon_schedule.start", self.start),
            ("epsilon_schedule.end", self.end),
        ];
        for (name, v) in endpoints {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigurationError::parameter(
                    name,
                    format!("{v} is outside [0, 1]"),
                ));
            }
        }
        Ok(())
    }
}
