//! Call transports
//!
//! A transport establishes the call with the assistant and carries its
//! messages. Two variants are provided:
//! - `MockTransport`: simulated connection delay and scripted replies
//! - `NatsTransport`: call control and messages over NATS subjects
//!
//! Both normalize incoming messages to `TranscriptEntry` before publishing
//! them as `"message"` events on their listener registry.

mod factory;
mod messages;
mod mock;
mod nats;

pub use factory::{ConfiguredTransportFactory, TransportFactory};
pub use messages::{CallControl, WireMessage};
pub use mock::{MockTransport, MockTransportConfig, DEFAULT_GREETING};
pub use nats::NatsTransport;

use crate::registry::ListenerRegistry;
use crate::session::TranscriptEntry;
use anyhow::Result;

/// Call transport capability
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Establish a call with the given assistant
    async fn connect(&self, assistant_id: &str) -> Result<()>;

    /// Tear down the call
    async fn disconnect(&self) -> Result<()>;

    /// Send user text into the call
    async fn send_text(&self, text: &str) -> Result<()>;

    /// Listener registry the transport publishes `"message"` events on
    fn events(&self) -> &ListenerRegistry<TranscriptEntry>;

    /// Transport name for logging
    fn name(&self) -> &str;
}
