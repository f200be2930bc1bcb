use voice_call::transport::CallControl;
use voice_call::{EntryKind, SpeakerRole, TranscriptEntry, WireMessage};

fn parse(json: &str) -> anyhow::Result<TranscriptEntry> {
    let wire: WireMessage = serde_json::from_str(json)?;
    TranscriptEntry::try_from(wire)
}

#[test]
fn test_speaker_text_shape() {
    let entry = parse(
        r#"{
        "type": "transcript",
        "speaker": "agent",
        "text": "Hello, I am your whistleblower assistant."
    }"#,
    )
    .unwrap();

    assert_eq!(entry.kind, EntryKind::Transcript);
    assert_eq!(entry.speaker_role, SpeakerRole::Assistant);
    assert_eq!(entry.text, "Hello, I am your whistleblower assistant.");
}

#[test]
fn test_role_content_shape() {
    let entry = parse(
        r#"{
        "type": "message",
        "role": "user",
        "content": "I need to report something"
    }"#,
    )
    .unwrap();

    assert_eq!(entry.kind, EntryKind::Message);
    assert_eq!(entry.speaker_role, SpeakerRole::User);
    assert_eq!(entry.text, "I need to report something");
}

#[test]
fn test_role_wins_over_speaker_and_text_over_content() {
    let entry = parse(
        r#"{
        "type": "transcript",
        "speaker": "user",
        "role": "assistant",
        "text": "from text",
        "content": "from content"
    }"#,
    )
    .unwrap();

    assert_eq!(entry.speaker_role, SpeakerRole::Assistant);
    assert_eq!(entry.text, "from text");
}

#[test]
fn test_unknown_type_rejected() {
    let err = parse(r#"{"type": "status-update", "role": "assistant", "text": "x"}"#).unwrap_err();
    assert!(err.to_string().contains("status-update"));
}

#[test]
fn test_missing_role_rejected() {
    assert!(parse(r#"{"type": "transcript", "text": "who said this?"}"#).is_err());
}

#[test]
fn test_unknown_role_rejected() {
    let err = parse(r#"{"type": "transcript", "speaker": "narrator", "text": "x"}"#).unwrap_err();
    assert!(err.to_string().contains("narrator"));
}

#[test]
fn test_missing_text_rejected() {
    assert!(parse(r#"{"type": "message", "role": "user"}"#).is_err());
}

#[test]
fn test_transcript_entry_serialization() {
    let entry = TranscriptEntry::assistant("Hi");
    let json = serde_json::to_string(&entry).unwrap();

    assert!(json.contains("\"kind\":\"transcript\""));
    assert!(json.contains("\"speakerRole\":\"assistant\""));
    assert!(json.contains("\"text\":\"Hi\""));
}

#[test]
fn test_call_control_start_serialization() {
    let msg = CallControl::Start {
        call_id: "call-1".to_string(),
        assistant_id: "whistleblower-assistant".to_string(),
        token: None,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"type\":\"start\""));
    assert!(json.contains("\"assistant_id\":\"whistleblower-assistant\""));
    assert!(!json.contains("token"));

    let deserialized: CallControl = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, msg);
}

#[test]
fn test_call_control_say_and_stop() {
    let say = serde_json::to_string(&CallControl::Say {
        call_id: "call-1".to_string(),
        text: "hello".to_string(),
    })
    .unwrap();
    assert!(say.contains("\"type\":\"say\""));

    let stop: CallControl = serde_json::from_str(r#"{"type": "stop", "call_id": "call-1"}"#).unwrap();
    assert_eq!(
        stop,
        CallControl::Stop {
            call_id: "call-1".to_string()
        }
    );
}
