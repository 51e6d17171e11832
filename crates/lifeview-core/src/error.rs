use thiserror::Error;

use crate::mode::ApplicationMode;

/// Why a network exchange with the remote simulation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Operator actions rejected by the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{action} is not available in {mode} mode")]
    NotAllowed {
        action: String,
        mode: ApplicationMode,
    },
    #[error("no confirmation is pending")]
    NoPendingConfirmation,
}
