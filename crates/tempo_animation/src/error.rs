//! Animation error types

use thiserror::Error;

/// Tween, sequence and preset errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// Timing configuration cannot drive a tween
    #[error("Invalid tween config: {0}")]
    InvalidConfig(String),

    /// A required endpoint was never supplied to the builder
    #[error("Tween is missing its {0} value")]
    MissingEndpoint(&'static str),

    /// The tween was destroyed and can no longer be used
    #[error("Tween has been destroyed")]
    Destroyed,

    /// A sequence child uses timing the sequence cannot remap accurately
    #[error("Sequence child at keypoint {keypoint}s uses {feature}, which sequences do not remap")]
    UnsupportedCompositionFeature { keypoint: f64, feature: &'static str },

    /// Timing presets could not be parsed
    #[error("Failed to parse timing presets: {0}")]
    Presets(String),
}

impl TweenError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// How a run of the per-frame loop ended
///
/// Cancellation is an outcome, not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage finished
    Completed,
    /// The run token was invalidated before completion
    Cancelled,
}

impl RunOutcome {
    pub fn is_completed(self) -> bool {
        self == RunOutcome::Completed
    }
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, TweenError>;
