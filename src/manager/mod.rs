//! Process-wide call handle
//!
//! `SessionManager` owns the lazily created transport and at most one live
//! `Session`. Callers hold the manager explicitly (e.g., in HTTP state) and
//! must call `shutdown` before dropping it so a live call is disconnected.

mod manager;
mod status;

pub use manager::SessionManager;
pub use status::ManagerStatus;
