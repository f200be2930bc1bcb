use crate::session::{EntryKind, SpeakerRole, TranscriptEntry};
use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

/// Message as received from the assistant service
///
/// Two historical shapes share this type: `{type, speaker, text}` and
/// `{type, role, content}`. They are normalized into `TranscriptEntry`
/// before anything else sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub message_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

fn parse_role(value: &str) -> Option<SpeakerRole> {
    match value {
        "assistant" | "agent" | "bot" => Some(SpeakerRole::Assistant),
        "user" => Some(SpeakerRole::User),
        _ => None,
    }
}

impl TryFrom<WireMessage> for TranscriptEntry {
    type Error = anyhow::Error;

    fn try_from(msg: WireMessage) -> Result<Self, Self::Error> {
        let kind = match msg.message_type.as_str() {
            "transcript" => EntryKind::Transcript,
            "message" => EntryKind::Message,
            other => bail!("Unsupported message type '{}'", other),
        };

        let raw_role = msg
            .role
            .as_deref()
            .or(msg.speaker.as_deref())
            .ok_or_else(|| anyhow!("Message has neither role nor speaker"))?;
        let speaker_role =
            parse_role(raw_role).ok_or_else(|| anyhow!("Unknown speaker role '{}'", raw_role))?;

        let text = msg
            .text
            .or(msg.content)
            .ok_or_else(|| anyhow!("Message has neither text nor content"))?;

        Ok(TranscriptEntry {
            kind,
            speaker_role,
            text,
        })
    }
}

/// Call control message published by `NatsTransport`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallControl {
    Start {
        call_id: String,
        assistant_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Say {
        call_id: String,
        text: String,
    },
    Stop {
        call_id: String,
    },
}
