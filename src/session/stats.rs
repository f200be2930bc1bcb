use super::state::SessionState;
use crate::turn::TurnState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a call session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// Assistant the call was started with, once `start` has been called
    pub assistant_id: Option<String>,

    /// Current lifecycle state
    pub state: SessionState,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Seconds since the session was created
    pub duration_secs: f64,

    /// Number of transcript entries received
    pub transcript_len: usize,

    /// Turn state derived from the transcript at the time of the snapshot
    pub turn_state: TurnState,
}
