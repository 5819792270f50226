//! Error types for the rollout trigger.

use thiserror::Error;

/// Result type alias for trigger operations.
pub type TriggerResult<T> = Result<T, TriggerError>;

/// Errors returned while patching the target deployment.
///
/// The display text is surfaced verbatim to the caller after
/// `unable to update deployment: `.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The API server answered with a failure status.
    #[error("{message} ({reason}, {code})")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// The request never got a usable answer (connect, TLS, timeout, decode).
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<kube::Error> for TriggerError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(resp) => TriggerError::Api {
                code: resp.code,
                reason: resp.reason,
                message: resp.message,
            },
            other => TriggerError::Transport(other.to_string()),
        }
    }
}
