use crate::session::SessionState;
use thiserror::Error;

/// Result type for session and manager operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by `Session` and `SessionManager`
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation is not valid in the session's current state
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The transport could not be created or failed to connect
    #[error("Failed to start the voice call: {0:#}")]
    Init(#[source] anyhow::Error),

    /// Operation requires an active call and none exists
    #[error("Cannot {operation}: no active call")]
    NotActive { operation: &'static str },

    /// `start` resolved after a concurrent `stop` had already ended the session
    #[error("Call was ended before it finished connecting")]
    Aborted,

    /// The transport rejected an in-call operation
    #[error("Call transport error: {0:#}")]
    Transport(#[source] anyhow::Error),
}

impl SessionError {
    /// Short user-facing title, used as the fault context
    pub fn title(&self) -> &'static str {
        match self {
            SessionError::InvalidState { .. } => "Invalid call state",
            SessionError::Init(_) => "Failed to start the voice call",
            SessionError::NotActive { .. } => "No active call",
            SessionError::Aborted => "Call cancelled",
            SessionError::Transport(_) => "Voice call error",
        }
    }
}
