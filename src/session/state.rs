use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single call
///
/// `Uninitialized → Starting → Active → Ending → Ended`. A failed start goes
/// straight from `Starting` to `Ended`. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Starting,
    Active,
    Ending,
    Ended,
}

impl SessionState {
    /// Whether transport messages are accepted into the transcript
    pub fn accepts_messages(self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Active)
    }

    /// Whether the session still holds (or is acquiring) a transport connection
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Active | SessionState::Ending
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Starting => "starting",
            SessionState::Active => "active",
            SessionState::Ending => "ending",
            SessionState::Ended => "ended",
        };
        f.write_str(name)
    }
}
