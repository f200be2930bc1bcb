use super::messages::{CallControl, WireMessage};
use super::Transport;
use crate::fault::FaultSink;
use crate::registry::{ListenerRegistry, MESSAGE_EVENT};
use crate::session::TranscriptEntry;
use anyhow::{bail, Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Call transport over NATS
///
/// Control messages go to `<prefix>.<call_id>.control`; assistant and user
/// messages arrive on `<prefix>.<call_id>.message`. Every `connect` opens a
/// new call with a fresh call id.
pub struct NatsTransport {
    url: String,
    subject_prefix: String,
    token: Option<String>,
    connection: Mutex<Option<Connection>>,
    events: Arc<ListenerRegistry<TranscriptEntry>>,
    faults: Arc<dyn FaultSink>,
}

/// One connected call
struct Connection {
    call_id: String,
    client: Client,
    receive_task: JoinHandle<()>,
}

impl NatsTransport {
    pub fn new(
        url: impl Into<String>,
        subject_prefix: impl Into<String>,
        token: Option<String>,
        faults: Arc<dyn FaultSink>,
    ) -> Self {
        Self {
            url: url.into(),
            subject_prefix: subject_prefix.into(),
            token,
            connection: Mutex::new(None),
            events: Arc::new(ListenerRegistry::new()),
            faults,
        }
    }

    /// Id of the connected call, if any
    pub async fn call_id(&self) -> Option<String> {
        self.connection
            .lock()
            .await
            .as_ref()
            .map(|conn| conn.call_id.clone())
    }

    pub fn control_subject(&self, call_id: &str) -> String {
        format!("{}.{}.control", self.subject_prefix, call_id)
    }

    pub fn message_subject(&self, call_id: &str) -> String {
        format!("{}.{}.message", self.subject_prefix, call_id)
    }

    async fn publish_control(client: &Client, subject: String, control: &CallControl) -> Result<()> {
        let payload = serde_json::to_vec(control)?;

        client
            .publish(subject, payload.into())
            .await
            .context("Failed to publish call control message")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for NatsTransport {
    async fn connect(&self, assistant_id: &str) -> Result<()> {
        // Held for the whole setup so two connects can't interleave
        let mut connection = self.connection.lock().await;
        if let Some(conn) = connection.as_ref() {
            bail!("NATS call {} is already connected", conn.call_id);
        }

        info!("Connecting to NATS at {}", self.url);

        let client = async_nats::connect(self.url.as_str())
            .await
            .context("Failed to connect to NATS")?;

        let call_id = uuid::Uuid::new_v4().to_string();
        let subject = self.message_subject(&call_id);
        let mut subscriber = client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to call messages")?;

        info!("Subscribed to {}", subject);

        let start = CallControl::Start {
            call_id: call_id.clone(),
            assistant_id: assistant_id.to_string(),
            token: self.token.clone(),
        };
        Self::publish_control(&client, self.control_subject(&call_id), &start).await?;

        let events = Arc::clone(&self.events);
        let faults = Arc::clone(&self.faults);
        let receive_task = tokio::spawn(async move {
            info!("Call message task started");

            while let Some(msg) = subscriber.next().await {
                let wire = match serde_json::from_slice::<WireMessage>(&msg.payload) {
                    Ok(wire) => wire,
                    Err(e) => {
                        warn!("Failed to parse call message: {}", e);
                        continue;
                    }
                };

                match TranscriptEntry::try_from(wire) {
                    Ok(entry) => {
                        events.publish(MESSAGE_EVENT, &entry, faults.as_ref());
                    }
                    Err(e) => faults.report("Unrecognized call message", &e),
                }
            }

            info!("Call message task stopped");
        });

        info!("Call {} started with assistant {}", call_id, assistant_id);

        *connection = Some(Connection {
            call_id,
            client,
            receive_task,
        });

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(conn) = self.connection.lock().await.take() else {
            return Ok(());
        };

        conn.receive_task.abort();
        info!("Stopping call {}", conn.call_id);

        let stop = CallControl::Stop {
            call_id: conn.call_id.clone(),
        };
        Self::publish_control(&conn.client, self.control_subject(&conn.call_id), &stop).await?;

        conn.client
            .flush()
            .await
            .context("Failed to flush NATS connection")?;

        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        let guard = self.connection.lock().await;
        let Some(conn) = guard.as_ref() else {
            bail!("NATS call is not connected");
        };

        let say = CallControl::Say {
            call_id: conn.call_id.clone(),
            text: text.to_string(),
        };
        Self::publish_control(&conn.client, self.control_subject(&conn.call_id), &say).await
    }

    fn events(&self) -> &ListenerRegistry<TranscriptEntry> {
        &self.events
    }

    fn name(&self) -> &str {
        "nats"
    }
}
