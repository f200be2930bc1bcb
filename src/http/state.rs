use crate::fault::FaultLog;
use crate::manager::SessionManager;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The process-wide call handle
    pub manager: Arc<SessionManager>,

    /// Faults reported by the manager, sessions and transport
    pub faults: Arc<FaultLog>,

    /// Assistant used when a start request doesn't name one
    pub default_assistant: String,
}

impl AppState {
    pub fn new(
        manager: Arc<SessionManager>,
        faults: Arc<FaultLog>,
        default_assistant: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            faults,
            default_assistant: default_assistant.into(),
        }
    }
}
