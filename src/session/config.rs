use serde::{Deserialize, Serialize};

/// What happens to the accumulated transcript when a call ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRetention {
    /// Keep the transcript readable after `stop`
    #[default]
    Retain,
    /// Drop the transcript as part of `stop`
    Clear,
}

/// Configuration for a call session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "call-5f0c...")
    pub session_id: String,

    /// Transcript policy applied on `stop`
    pub retention: TranscriptRetention,
}

impl SessionConfig {
    pub fn with_retention(retention: TranscriptRetention) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("call-{}", uuid::Uuid::new_v4()),
            retention: TranscriptRetention::Retain,
        }
    }
}
