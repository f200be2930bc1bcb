use crate::session::TranscriptRetention;
use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub assistant: AssistantConfig,
    pub transport: TransportConfig,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voice-call".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8085,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Assistant used when a start request doesn't name one
    pub id: String,

    /// Opaque API key handed to the transport
    pub api_key: Option<String>,

    /// Where an interactively entered API key is persisted
    pub credentials_path: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            id: "whistleblower-assistant".to_string(),
            api_key: None,
            credentials_path: "~/.config/voice-call/credentials.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Mock,
    Nats,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,

    /// NATS server URL (nats transport)
    pub nats_url: String,

    /// Subject prefix for call control and messages (nats transport)
    pub subject_prefix: String,

    /// Simulated connect delay (mock transport)
    pub connect_delay_ms: u64,

    /// Simulate a connection failure (mock transport)
    pub fail_connect: bool,

    /// Assistant greeting emitted on connect (mock transport)
    pub greeting: Option<String>,

    /// Scripted assistant replies (mock transport)
    pub replies: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Mock,
            nats_url: "nats://localhost:4222".to_string(),
            subject_prefix: "voice.call".to_string(),
            connect_delay_ms: 1000,
            fail_connect: false,
            greeting: Some(crate::transport::DEFAULT_GREETING.to_string()),
            replies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Keep the transcript readable after a call ends
    pub retain_transcript_on_stop: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            retain_transcript_on_stop: true,
        }
    }
}

impl SessionSettings {
    pub fn retention(&self) -> TranscriptRetention {
        if self.retain_transcript_on_stop {
            TranscriptRetention::Retain
        } else {
            TranscriptRetention::Clear
        }
    }
}

impl Config {
    /// Load `path` (any format the `config` crate understands, extension
    /// optional) overlaid with `VOICE_CALL__SECTION__KEY` environment
    /// variables. A missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICE_CALL").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
