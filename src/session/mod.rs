//! Voice call session management
//!
//! This module provides the `Session` abstraction that manages:
//! - The call lifecycle (`Uninitialized → Starting → Active → Ending → Ended`)
//! - Subscription to the transport's message stream
//! - The ordered, append-only transcript
//! - External listeners re-notified for every appended entry

mod config;
mod session;
mod state;
mod stats;
mod transcript;

pub use config::{SessionConfig, TranscriptRetention};
pub use session::Session;
pub use state::SessionState;
pub use stats::SessionStats;
pub use transcript::{EntryKind, SpeakerRole, TranscriptEntry};
