use super::Transport;
use crate::fault::FaultSink;
use crate::registry::{ListenerRegistry, MESSAGE_EVENT};
use crate::session::TranscriptEntry;
use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_GREETING: &str =
    "Hello, I am your whistleblower assistant. How can I help you today?";

/// Behaviour of the simulated call
#[derive(Debug, Clone)]
pub struct MockTransportConfig {
    /// Simulated connection-establishment delay
    pub connect_delay: Duration,

    /// Make `connect` fail after the delay
    pub fail_connect: bool,

    /// Make `disconnect` fail (the call is still considered closed)
    pub fail_disconnect: bool,

    /// Assistant line emitted once connected
    pub greeting: Option<String>,

    /// Assistant replies to `send_text`, used in order and then cycled
    pub replies: Vec<String>,
}

impl Default for MockTransportConfig {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_millis(1000),
            fail_connect: false,
            fail_disconnect: false,
            greeting: Some(DEFAULT_GREETING.to_string()),
            replies: Vec::new(),
        }
    }
}

/// Simulated transport for demos and tests
pub struct MockTransport {
    config: MockTransportConfig,
    events: ListenerRegistry<TranscriptEntry>,
    faults: Arc<dyn FaultSink>,
    connected: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    next_reply: AtomicUsize,
    assistant_id: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn new(config: MockTransportConfig, faults: Arc<dyn FaultSink>) -> Self {
        Self {
            config,
            events: ListenerRegistry::new(),
            faults,
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            next_reply: AtomicUsize::new(0),
            assistant_id: Mutex::new(None),
        }
    }

    /// Deliver a message as if it came from the remote end
    pub fn inject(&self, entry: TranscriptEntry) -> usize {
        self.events
            .publish(MESSAGE_EVENT, &entry, self.faults.as_ref())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Assistant the last `connect` was made for
    pub fn assistant_id(&self) -> Option<String> {
        self.assistant_id.lock().clone()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn connect(&self, assistant_id: &str) -> Result<()> {
        info!("Starting call with assistant {}", assistant_id);
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        *self.assistant_id.lock() = Some(assistant_id.to_string());

        tokio::time::sleep(self.config.connect_delay).await;

        if self.config.fail_connect {
            bail!("Simulated connection failure for assistant {}", assistant_id);
        }

        self.connected.store(true, Ordering::SeqCst);

        if let Some(greeting) = &self.config.greeting {
            self.inject(TranscriptEntry::assistant(greeting.clone()));
        }

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        info!("Stopping call");
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);

        if self.config.fail_disconnect {
            bail!("Simulated teardown failure");
        }

        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        if !self.is_connected() {
            bail!("Mock call is not connected");
        }

        self.inject(TranscriptEntry::user(text));

        if !self.config.replies.is_empty() {
            let index = self.next_reply.fetch_add(1, Ordering::SeqCst) % self.config.replies.len();
            self.inject(TranscriptEntry::assistant(self.config.replies[index].clone()));
        }

        Ok(())
    }

    fn events(&self) -> &ListenerRegistry<TranscriptEntry> {
        &self.events
    }

    fn name(&self) -> &str {
        "mock"
    }
}
