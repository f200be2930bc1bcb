use crate::session::{SessionState, TranscriptEntry};
use crate::turn::TurnState;
use serde::{Deserialize, Serialize};

/// Snapshot of what a caller needs to render the call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerStatus {
    /// A start is in flight
    pub loading: bool,

    /// Last initialization or start failure, cleared by the next successful start
    pub error: Option<String>,

    pub is_call_active: bool,

    pub session_id: Option<String>,

    pub state: Option<SessionState>,

    pub turn_state: TurnState,

    pub transcript: Vec<TranscriptEntry>,
}
