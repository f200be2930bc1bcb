use super::status::ManagerStatus;
use crate::error::{SessionError, SessionResult};
use crate::fault::FaultSink;
use crate::registry::ListenerHandle;
use crate::session::{Session, SessionConfig, SessionState, TranscriptEntry, TranscriptRetention};
use crate::transport::{Transport, TransportFactory};
use crate::turn::{infer_turn_state, TurnState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Holder of at most one live call session
///
/// Every error is reported to the fault sink before it is returned, so
/// callers may ignore the `Err` side when the sink already notifies the user.
pub struct SessionManager {
    factory: Arc<dyn TransportFactory>,
    faults: Arc<dyn FaultSink>,
    retention: TranscriptRetention,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    session: Mutex<Option<Arc<Session>>>,
    final_transcript: Mutex<Vec<TranscriptEntry>>,
    loading: AtomicBool,
    error: Mutex<Option<String>>,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn TransportFactory>, faults: Arc<dyn FaultSink>) -> Self {
        Self {
            factory,
            faults,
            retention: TranscriptRetention::default(),
            transport: Mutex::new(None),
            session: Mutex::new(None),
            final_transcript: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// Transcript policy applied to sessions created from now on
    pub fn with_retention(mut self, retention: TranscriptRetention) -> Self {
        self.retention = retention;
        self
    }

    /// The transport, created on first use
    pub fn transport(&self) -> SessionResult<Arc<dyn Transport>> {
        let mut slot = self.transport.lock();
        if let Some(transport) = slot.as_ref() {
            return Ok(Arc::clone(transport));
        }

        let transport = self.factory.create().map_err(SessionError::Init)?;
        info!("Initialized {} transport", transport.name());
        *slot = Some(Arc::clone(&transport));

        Ok(transport)
    }

    /// The current session, or a fresh `Uninitialized` one if there is none
    /// or the last one has ended
    pub fn get_or_create_session(&self) -> SessionResult<Arc<Session>> {
        let mut slot = self.session.lock();
        if let Some(session) = slot.as_ref() {
            if session.state() != SessionState::Ended {
                return Ok(Arc::clone(session));
            }
        }

        let transport = match self.transport() {
            Ok(transport) => transport,
            Err(e) => return self.fail(e),
        };

        let session = Arc::new(Session::new(
            SessionConfig::with_retention(self.retention),
            transport,
            Arc::clone(&self.faults),
        ));
        *slot = Some(Arc::clone(&session));

        Ok(session)
    }

    /// Start a call with `assistant_id`
    ///
    /// Rejected with `InvalidState` while another call is starting, active
    /// or ending.
    pub async fn start(&self, assistant_id: &str) -> SessionResult<()> {
        // A stopped call leaves the slot before its connect resolves, so the
        // slot alone can't tell that a start is still in flight
        let Some(_loading) = LoadingGuard::acquire(&self.loading) else {
            return self.fail(SessionError::InvalidState {
                operation: "start",
                state: SessionState::Starting,
            });
        };

        let session = self.get_or_create_session()?;

        let state = session.state();
        if state != SessionState::Uninitialized {
            return self.fail(SessionError::InvalidState {
                operation: "start",
                state,
            });
        }

        let result = session.start(assistant_id).await;

        match result {
            Ok(()) => {
                *self.error.lock() = None;
                self.final_transcript.lock().clear();
                info!("Call started with assistant {}", assistant_id);
                Ok(())
            }
            Err(e) => {
                if session.state() == SessionState::Ended {
                    self.release(&session);
                }
                self.fail(e)
            }
        }
    }

    /// Stop the current call, if any. Never fails; returns whether a call
    /// was actually stopped.
    pub async fn stop(&self) -> bool {
        let session = {
            let mut slot = self.session.lock();
            match slot.as_ref() {
                Some(session) if session.state().is_live() => slot.take(),
                _ => None,
            }
        };

        let Some(session) = session else {
            debug!("No active call to stop");
            return false;
        };

        let stopped = session.stop().await;
        *self.final_transcript.lock() = session.transcript();

        if stopped {
            info!("Call ended");
        }
        stopped
    }

    /// Send user text into the active call
    pub async fn send_text(&self, text: &str) -> SessionResult<()> {
        let Some(session) = self.active_session() else {
            return self.fail(SessionError::NotActive {
                operation: "send text",
            });
        };

        match session.send_text(text).await {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    /// Listen for session events on the current (or next) session
    pub fn subscribe<F>(&self, event: &str, callback: F) -> SessionResult<ListenerHandle>
    where
        F: Fn(&TranscriptEntry) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let session = self.get_or_create_session()?;
        match session.subscribe(event, callback) {
            Ok(handle) => Ok(handle),
            Err(e) => self.fail(e),
        }
    }

    pub fn unsubscribe(&self, handle: &ListenerHandle) -> bool {
        self.current_session()
            .is_some_and(|session| session.unsubscribe(handle))
    }

    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.session.lock().clone()
    }

    fn active_session(&self) -> Option<Arc<Session>> {
        self.current_session()
            .filter(|session| session.state() == SessionState::Active)
    }

    pub fn is_call_active(&self) -> bool {
        self.active_session().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    /// Transcript of the current call, or of the last one if none is running
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        match self.current_session() {
            Some(session) if session.state() != SessionState::Uninitialized => {
                session.transcript()
            }
            _ => self.final_transcript.lock().clone(),
        }
    }

    pub fn turn_state(&self) -> TurnState {
        match self.current_session() {
            Some(session) => session.turn_state(),
            None => TurnState::Idle,
        }
    }

    pub fn status(&self) -> ManagerStatus {
        let session = self.current_session();
        let transcript = self.transcript();
        let state = session.as_ref().map(|s| s.state());
        let is_call_active = state == Some(SessionState::Active);

        ManagerStatus {
            loading: self.is_loading(),
            error: self.last_error(),
            is_call_active,
            session_id: session.as_ref().map(|s| s.id().to_string()),
            state,
            turn_state: infer_turn_state(is_call_active, &transcript),
            transcript,
        }
    }

    /// Stop any live call and release the session and transport
    pub async fn shutdown(&self) {
        info!("Shutting down session manager");
        self.stop().await;
        self.session.lock().take();
        self.transport.lock().take();
    }

    /// Drop an ended `session` from the slot if it is still the held one
    fn release(&self, session: &Arc<Session>) {
        let mut slot = self.session.lock();
        if slot.as_ref().is_some_and(|held| Arc::ptr_eq(held, session)) {
            slot.take();
            *self.final_transcript.lock() = session.transcript();
        }
    }

    fn fail<T>(&self, error: SessionError) -> SessionResult<T> {
        let message = error.to_string();
        self.faults.report(error.title(), &anyhow::anyhow!("{}", message));

        if matches!(error, SessionError::Init(_)) {
            *self.error.lock() = Some(message);
        }

        Err(error)
    }
}

/// Marks a `start` as in flight until dropped, including when the start
/// future itself is dropped mid-connect
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
