use super::config::{SessionConfig, TranscriptRetention};
use super::state::SessionState;
use super::stats::SessionStats;
use super::transcript::TranscriptEntry;
use crate::error::{SessionError, SessionResult};
use crate::fault::FaultSink;
use crate::registry::{ListenerHandle, ListenerRegistry, MESSAGE_EVENT};
use crate::transport::Transport;
use crate::turn::{infer_turn_state, TurnState};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

struct SessionInner {
    state: SessionState,
    assistant_id: Option<String>,
    transcript: Vec<TranscriptEntry>,
}

/// State reachable from the transport's message listener
struct Shared {
    session_id: String,
    inner: Mutex<SessionInner>,
    listeners: ListenerRegistry<TranscriptEntry>,
    faults: Arc<dyn FaultSink>,
}

impl Shared {
    /// Append to the transcript and re-publish to external listeners.
    /// Dropped unless the session is starting or active.
    fn append_message(&self, entry: TranscriptEntry) -> bool {
        {
            let mut inner = self.inner.lock();
            if !inner.state.accepts_messages() {
                debug!(
                    "Session {} is {}; dropping {} message",
                    self.session_id, inner.state, entry.speaker_role
                );
                return false;
            }
            inner.transcript.push(entry.clone());
        }

        self.listeners
            .publish(MESSAGE_EVENT, &entry, self.faults.as_ref());
        true
    }
}

/// One voice call, from `start` to `stop`
///
/// A session is single-use: once `Ended`, a new one has to be created for
/// the next call.
pub struct Session {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    transport_listener: Mutex<Option<ListenerHandle>>,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        faults: Arc<dyn FaultSink>,
    ) -> Self {
        info!(
            "Creating call session {} on {} transport",
            config.session_id,
            transport.name()
        );

        let shared = Arc::new(Shared {
            session_id: config.session_id.clone(),
            inner: Mutex::new(SessionInner {
                state: SessionState::Uninitialized,
                assistant_id: None,
                transcript: Vec::new(),
            }),
            listeners: ListenerRegistry::new(),
            faults,
        });

        Self {
            config,
            transport,
            shared,
            transport_listener: Mutex::new(None),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn assistant_id(&self) -> Option<String> {
        self.shared.inner.lock().assistant_id.clone()
    }

    pub fn retention(&self) -> TranscriptRetention {
        self.config.retention
    }

    /// Start the call
    ///
    /// Resolves to `Active` on success. A transport failure ends the session
    /// and returns `Init`. If `stop` ran while the transport was connecting,
    /// the late connection is closed again and `Aborted` is returned.
    pub async fn start(&self, assistant_id: &str) -> SessionResult<()> {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != SessionState::Uninitialized {
                return Err(SessionError::InvalidState {
                    operation: "start",
                    state: inner.state,
                });
            }
            inner.state = SessionState::Starting;
            inner.assistant_id = Some(assistant_id.to_string());
        }

        info!(
            "Starting call session {} with assistant {}",
            self.id(),
            assistant_id
        );

        // Registered before connecting so the greeting sent during call
        // setup lands in the transcript
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let handle = self
            .transport
            .events()
            .subscribe(MESSAGE_EVENT, move |entry: &TranscriptEntry| {
                if let Some(shared) = weak.upgrade() {
                    shared.append_message(entry.clone());
                }
                Ok(())
            });
        *self.transport_listener.lock() = Some(handle);

        match self.transport.connect(assistant_id).await {
            Ok(()) => {
                let raced = {
                    let mut inner = self.shared.inner.lock();
                    if inner.state == SessionState::Starting {
                        inner.state = SessionState::Active;
                        None
                    } else {
                        Some(inner.state)
                    }
                };

                let Some(state) = raced else {
                    info!("Call session {} is active", self.id());
                    return Ok(());
                };

                warn!(
                    "Call session {} was stopped while connecting (now {}); closing late connection",
                    self.id(),
                    state
                );
                self.release_transport_listener();
                if let Err(e) = self.transport.disconnect().await {
                    self.shared
                        .faults
                        .report("Failed to close the cancelled call", &e);
                }
                Err(SessionError::Aborted)
            }
            Err(e) => {
                let previous = self.shared.inner.lock().state;
                self.teardown();

                if previous != SessionState::Starting {
                    warn!(
                        "Call session {} failed to connect after being stopped: {:#}",
                        self.id(),
                        e
                    );
                    return Err(SessionError::Aborted);
                }

                // Nothing said during a failed setup belongs to a call
                self.shared.inner.lock().transcript.clear();

                error!("Call session {} failed to start: {:#}", self.id(), e);
                Err(SessionError::Init(e))
            }
        }
    }

    /// End the call
    ///
    /// Valid while starting or active; any other state is a no-op that
    /// returns false. Transport teardown errors go to the fault sink and the
    /// session still ends.
    pub async fn stop(&self) -> bool {
        let previous = {
            let mut inner = self.shared.inner.lock();
            match inner.state {
                SessionState::Starting | SessionState::Active => {
                    let previous = inner.state;
                    inner.state = SessionState::Ending;
                    previous
                }
                other => {
                    debug!("Call session {} is {}; stop ignored", self.id(), other);
                    return false;
                }
            }
        };

        info!("Stopping call session {} (was {})", self.id(), previous);

        if let Err(e) = self.transport.disconnect().await {
            self.shared
                .faults
                .report("Failed to end the call properly", &e);
        }

        self.teardown();

        info!("Call session {} ended", self.id());
        true
    }

    /// Send user text into an active call
    pub async fn send_text(&self, text: &str) -> SessionResult<()> {
        if !self.is_active() {
            return Err(SessionError::NotActive {
                operation: "send text",
            });
        }

        self.transport
            .send_text(text)
            .await
            .map_err(SessionError::Transport)
    }

    /// Register an external listener for session events (`"message"`)
    pub fn subscribe<F>(&self, event: &str, callback: F) -> SessionResult<ListenerHandle>
    where
        F: Fn(&TranscriptEntry) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        // Hold the state lock so teardown can't drain the registry in between
        let inner = self.shared.inner.lock();
        if matches!(inner.state, SessionState::Ending | SessionState::Ended) {
            return Err(SessionError::InvalidState {
                operation: "subscribe",
                state: inner.state,
            });
        }

        Ok(self.shared.listeners.subscribe(event, callback))
    }

    pub fn unsubscribe(&self, handle: &ListenerHandle) -> bool {
        self.shared.listeners.unsubscribe(handle)
    }

    /// Number of external listeners still registered
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Snapshot of the transcript in arrival order
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.shared.inner.lock().transcript.clone()
    }

    pub fn turn_state(&self) -> TurnState {
        let inner = self.shared.inner.lock();
        infer_turn_state(inner.state == SessionState::Active, &inner.transcript)
    }

    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        let inner = self.shared.inner.lock();

        SessionStats {
            session_id: self.config.session_id.clone(),
            assistant_id: inner.assistant_id.clone(),
            state: inner.state,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            transcript_len: inner.transcript.len(),
            turn_state: infer_turn_state(inner.state == SessionState::Active, &inner.transcript),
        }
    }

    fn release_transport_listener(&self) {
        if let Some(handle) = self.transport_listener.lock().take() {
            self.transport.events().unsubscribe(&handle);
        }
    }

    /// Drain every listener, apply the retention policy and mark `Ended`
    fn teardown(&self) {
        self.release_transport_listener();

        let mut inner = self.shared.inner.lock();
        self.shared.listeners.clear();
        if self.config.retention == TranscriptRetention::Clear {
            inner.transcript.clear();
        }
        inner.state = SessionState::Ended;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let state = self.state();
        if state.is_live() {
            warn!(
                "Call session {} dropped while {}; transport was not disconnected",
                self.config.session_id, state
            );
        }
        self.release_transport_listener();
        self.shared.listeners.clear();
    }
}
