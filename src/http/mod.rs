//! HTTP API server for external control
//!
//! This module provides a REST API over the session manager:
//! - POST /call/start - Start a call (optional `assistant_id`)
//! - POST /call/stop - End the current call
//! - POST /call/say - Send user text into the call
//! - GET /call/status - Loading/error flags, state, turn state, transcript
//! - GET /call/transcript - Accumulated transcript
//! - GET /faults - Recent faults for user notification
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
