use super::{MockTransport, MockTransportConfig, NatsTransport, Transport};
use crate::config::{TransportConfig, TransportKind};
use crate::fault::FaultSink;
use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

/// Lazily constructs the transport a `SessionManager` uses
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn Transport>>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Result<Arc<dyn Transport>> + Send + Sync,
{
    fn create(&self) -> Result<Arc<dyn Transport>> {
        self()
    }
}

/// Builds the transport named by `TransportConfig::kind`
pub struct ConfiguredTransportFactory {
    config: TransportConfig,
    token: Option<String>,
    faults: Arc<dyn FaultSink>,
}

impl ConfiguredTransportFactory {
    pub fn new(config: TransportConfig, token: Option<String>, faults: Arc<dyn FaultSink>) -> Self {
        Self {
            config,
            token,
            faults,
        }
    }
}

impl From<&TransportConfig> for MockTransportConfig {
    fn from(config: &TransportConfig) -> Self {
        Self {
            connect_delay: Duration::from_millis(config.connect_delay_ms),
            fail_connect: config.fail_connect,
            fail_disconnect: false,
            greeting: config.greeting.clone(),
            replies: config.replies.clone(),
        }
    }
}

impl TransportFactory for ConfiguredTransportFactory {
    fn create(&self) -> Result<Arc<dyn Transport>> {
        match self.config.kind {
            TransportKind::Mock => Ok(Arc::new(MockTransport::new(
                MockTransportConfig::from(&self.config),
                Arc::clone(&self.faults),
            ))),

            TransportKind::Nats => {
                if self.config.nats_url.trim().is_empty() {
                    bail!("transport.nats_url must be set for the nats transport");
                }
                if self.token.is_none() {
                    bail!("An API key is required for the nats transport");
                }

                Ok(Arc::new(NatsTransport::new(
                    self.config.nats_url.clone(),
                    self.config.subject_prefix.clone(),
                    self.token.clone(),
                    Arc::clone(&self.faults),
                )))
            }
        }
    }
}
