//! Turn-state inference
//!
//! Which party is expected to speak is derived from the call's active flag
//! and the last transcript entry only. This assumes assistant and user
//! entries alternate and the transcript is in chronological order. Callers
//! re-evaluate on every `"message"` publish; the result is never stored.

use crate::session::{SpeakerRole, TranscriptEntry};
use serde::{Deserialize, Serialize};

/// Who currently holds the turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    AssistantSpeaking,
    UserListening,
}

/// Infer the turn state from `(is_active, transcript)`
pub fn infer_turn_state(is_active: bool, transcript: &[TranscriptEntry]) -> TurnState {
    if !is_active {
        return TurnState::Idle;
    }

    match transcript.last() {
        None => TurnState::Idle,
        Some(entry) if entry.speaker_role == SpeakerRole::Assistant => {
            TurnState::AssistantSpeaking
        }
        Some(_) => TurnState::UserListening,
    }
}
