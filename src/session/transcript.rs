use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Speech-recognized utterance
    Transcript,
    /// Text message exchanged during the call
    Message,
}

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    Assistant,
    User,
}

impl fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpeakerRole::Assistant => "assistant",
            SpeakerRole::User => "user",
        };
        f.pad(name)
    }
}

/// One recorded utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub kind: EntryKind,

    #[serde(rename = "speakerRole")]
    pub speaker_role: SpeakerRole,

    pub text: String,
}

impl TranscriptEntry {
    pub fn new(kind: EntryKind, speaker_role: SpeakerRole, text: impl Into<String>) -> Self {
        Self {
            kind,
            speaker_role,
            text: text.into(),
        }
    }

    /// Transcript entry spoken by the assistant
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(EntryKind::Transcript, SpeakerRole::Assistant, text)
    }

    /// Transcript entry spoken by the user
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(EntryKind::Transcript, SpeakerRole::User, text)
    }
}
