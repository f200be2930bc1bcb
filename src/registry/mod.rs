//! Event listener registry
//!
//! Callbacks are keyed by event name and kept in subscription order.
//! `publish` dispatches over a snapshot taken when dispatch starts, so a
//! callback may subscribe or unsubscribe (itself included) without affecting
//! the notification already in flight.

mod registry;

pub use registry::{Callback, ListenerHandle, ListenerRegistry};

/// Event name for transcript entries
pub const MESSAGE_EVENT: &str = "message";
