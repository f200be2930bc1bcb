use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::error;

/// Receives `(context, error)` pairs meant for the user
pub trait FaultSink: Send + Sync {
    fn report(&self, context: &str, error: &anyhow::Error);
}

/// Fault sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn report(&self, context: &str, error: &anyhow::Error) {
        error!("{}: {:#}", context, error);
    }
}

/// A fault recorded by `FaultLog`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fault {
    /// Where the fault happened (e.g., "Failed to start the voice call")
    pub context: String,

    /// Rendered error chain
    pub message: String,

    /// When the fault was reported
    pub at: DateTime<Utc>,
}

/// Bounded in-memory fault history, oldest entries dropped first
#[derive(Debug)]
pub struct FaultLog {
    capacity: usize,
    faults: Mutex<VecDeque<Fault>>,
}

impl FaultLog {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            faults: Mutex::new(VecDeque::new()),
        }
    }

    /// Recorded faults, oldest first
    pub fn recent(&self) -> Vec<Fault> {
        self.faults.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.faults.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.faults.lock().clear();
    }
}

impl Default for FaultLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl FaultSink for FaultLog {
    fn report(&self, context: &str, error: &anyhow::Error) {
        error!("{}: {:#}", context, error);

        let mut faults = self.faults.lock();
        if faults.len() == self.capacity {
            faults.pop_front();
        }
        faults.push_back(Fault {
            context: context.to_string(),
            message: format!("{:#}", error),
            at: Utc::now(),
        });
    }
}
