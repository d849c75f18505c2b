//! Common error types.

use thiserror::Error;

/// Main error type for the playground.
///
/// These are failures of the execution environment itself. Errors thrown by
/// user code never surface as a `PlaygroundError`; they are captured as log
/// lines instead.
#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error("Frame unavailable: {0}")]
    FrameUnavailable(String),

    #[error("Sandbox violation: {0}")]
    Sandbox(String),

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Invalid origin: {0}")]
    Origin(String),
}

pub type PlaygroundResult<T> = Result<T, PlaygroundError>;

impl PlaygroundError {
    pub fn frame_unavailable(msg: impl Into<String>) -> Self {
        Self::FrameUnavailable(msg.into())
    }

    pub fn sandbox(msg: impl Into<String>) -> Self {
        Self::Sandbox(msg.into())
    }

    pub fn js(msg: impl Into<String>) -> Self {
        Self::JavaScript(msg.into())
    }

    pub fn origin(msg: impl Into<String>) -> Self {
        Self::Origin(msg.into())
    }

    /// Whether this error means the execution environment could not be set up.
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::FrameUnavailable(_) | Self::Sandbox(_))
    }
}
