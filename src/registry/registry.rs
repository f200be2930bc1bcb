use crate::fault::FaultSink;
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A registered listener callback
pub type Callback<P> = Arc<dyn Fn(&P) -> Result<()> + Send + Sync>;

/// Handle returned by `subscribe`, used to remove the listener again
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    event: String,
    id: u64,
}

impl ListenerHandle {
    /// Event this listener was registered for
    pub fn event(&self) -> &str {
        &self.event
    }
}

struct Listener<P> {
    id: u64,
    callback: Callback<P>,
}

impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Mapping from event name to an ordered list of callbacks
pub struct ListenerRegistry<P> {
    listeners: Mutex<HashMap<String, Vec<Listener<P>>>>,
    next_id: AtomicU64,
}

impl<P> ListenerRegistry<P> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a callback to `event`'s listener list
    ///
    /// The same closure may be registered more than once; every registration
    /// gets its own handle and is invoked once per publish.
    pub fn subscribe<F>(&self, event: &str, callback: F) -> ListenerHandle
    where
        F: Fn(&P) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(Listener {
                id,
                callback: Arc::new(callback),
            });

        debug!("Subscribed listener {} to '{}'", id, event);

        ListenerHandle {
            event: event.to_string(),
            id,
        }
    }

    /// Remove a listener. Returns false if it was already removed.
    pub fn unsubscribe(&self, handle: &ListenerHandle) -> bool {
        let mut listeners = self.listeners.lock();

        let Some(list) = listeners.get_mut(&handle.event) else {
            return false;
        };

        let before = list.len();
        list.retain(|l| l.id != handle.id);
        let removed = list.len() != before;

        if list.is_empty() {
            listeners.remove(&handle.event);
        }

        removed
    }

    /// Invoke every listener for `event`, in subscription order
    ///
    /// Failing callbacks are reported to `faults` and do not stop the rest.
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, event: &str, payload: &P, faults: &dyn FaultSink) -> usize {
        // Snapshot, then release the lock before calling out
        let snapshot: Vec<Listener<P>> = match self.listeners.lock().get(event) {
            Some(list) => list.clone(),
            None => return 0,
        };

        for listener in &snapshot {
            if let Err(e) = (listener.callback)(payload) {
                faults.report(&format!("listener for '{}'", event), &e);
            }
        }

        snapshot.len()
    }

    /// Number of listeners registered for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Total number of listeners across all events
    pub fn len(&self) -> usize {
        self.listeners.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every listener for every event
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}

impl<P> Default for ListenerRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for ListenerRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
