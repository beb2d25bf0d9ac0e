use thiserror::Error;

/// Rejections produced by the state machine for client input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Malformed or out-of-range client input.
    #[error("{0}")]
    InvalidArgument(String),
    /// Operation not valid for the current mode or data.
    #[error("{0}")]
    InvalidState(String),
    /// Requested image or artwork is absent.
    #[error("{0}")]
    NotFound(String),
}

impl CommandError {
    /// Short machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            CommandError::InvalidArgument(_) => "invalid_argument",
            CommandError::InvalidState(_) => "invalid_state",
            CommandError::NotFound(_) => "not_found",
        }
    }
}
