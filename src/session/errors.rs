//! Session lifecycle and configuration errors

use thiserror::Error;

/// Errors surfaced to the caller by session lifecycle operations.
///
/// These are fatal to the requested operation, never to an already
/// running session; per-tick pipeline failures are handled internally as
/// skipped ticks with feedback.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `start` was called while a session is running.
    #[error("a workout session is already active")]
    SessionAlreadyActive,

    /// Construction-time configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `start` was called before the classifier finished loading.
    #[error("classifier model is not ready")]
    ModelNotReady,
}
