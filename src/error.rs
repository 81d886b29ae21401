use std::io;
use thiserror::Error;

/// Failure of a single exchange with the time-tracking service.
///
/// None of these are fatal: the reconciler logs them and carries on sampling
/// buttons and driving LEDs.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network link is down")]
    LinkDown,

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("request exceeded its time bound")]
    Timeout,

    #[error("server answered with status {0}")]
    Server(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] io::Error),

    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
