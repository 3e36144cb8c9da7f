use thiserror::Error;

/// Errors raised when a planner is asked to act where it cannot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    #[error("No actions available in state {0}")]
    NoActions(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Malformed environment models or planner parameters.
///
/// The planners only raise these where continuing is impossible (for example
/// sampling from an empty distribution). Skewed probabilities are not checked
/// on the hot path; use [`crate::validate_transitions`] at the boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Empty transition distribution for {0}")]
    EmptyDistribution(String),

    #[error("Transition probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("Transition probabilities sum to {0}, expected 1.0")]
    DistributionSum(f64),

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigurationError {
    /// Build a [`ConfigurationError::InvalidParameter`].
    pub fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenience Result type for planning operations
pub type Result<T> = std::result::Result<T, PlanningError>;
