use thiserror::Error;

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Failure taxonomy for overlay operations.
///
/// Nothing here is fatal: callers treat every variant as "nothing changed"
/// and decide whether to log, retry, or ignore.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Malformed or empty input. The operation left no partial state behind.
    #[error("invalid data: {0}")]
    Validation(String),

    /// A coordinate conversion or id lookup failed for the current view.
    /// The affected element is excluded from the current frame only.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// An operation was attempted before the host chart surface exists.
    #[error("host chart surface is not available")]
    HostUnavailable,
}
