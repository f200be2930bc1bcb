// Integration tests for the session manager
//
// The manager is built over a closure factory that hands out a shared
// MockTransport, so tests can drive the remote side directly.

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voice_call::{
    FaultLog, MockTransport, MockTransportConfig, SessionError, SessionManager, SessionState,
    TranscriptEntry, TranscriptRetention, Transport, TurnState, MESSAGE_EVENT,
};

fn quiet_mock() -> MockTransportConfig {
    MockTransportConfig {
        connect_delay: Duration::ZERO,
        greeting: None,
        ..Default::default()
    }
}

fn mock_manager(config: MockTransportConfig) -> (SessionManager, Arc<MockTransport>, Arc<FaultLog>) {
    let faults = Arc::new(FaultLog::default());
    let transport = Arc::new(MockTransport::new(config, faults.clone()));

    let shared = Arc::clone(&transport);
    let factory = move || -> anyhow::Result<Arc<dyn Transport>> {
        Ok(Arc::clone(&shared) as Arc<dyn Transport>)
    };

    let manager = SessionManager::new(Arc::new(factory), faults.clone());
    (manager, transport, faults)
}

#[tokio::test]
async fn test_alternating_messages_drive_turn_state() -> Result<()> {
    let (manager, transport, faults) = mock_manager(quiet_mock());

    manager.start("assistant-1").await?;
    assert!(manager.is_call_active());
    assert_eq!(manager.turn_state(), TurnState::Idle);

    let session = manager.current_session().expect("session after start");
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    manager.subscribe(MESSAGE_EVENT, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;

    transport.inject(TranscriptEntry::assistant("Hello, how can I help?"));
    assert_eq!(manager.turn_state(), TurnState::AssistantSpeaking);

    transport.inject(TranscriptEntry::user("I want to report misconduct"));
    assert_eq!(manager.turn_state(), TurnState::UserListening);

    transport.inject(TranscriptEntry::assistant("I can help with that"));
    assert_eq!(manager.turn_state(), TurnState::AssistantSpeaking);

    assert_eq!(seen.load(Ordering::SeqCst), 3);

    assert!(manager.stop().await);
    assert_eq!(session.state(), SessionState::Ended);
    assert_eq!(session.listener_count(), 0);
    assert!(transport.events().is_empty());
    assert_eq!(manager.turn_state(), TurnState::Idle);
    assert!(faults.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_start_while_active_is_rejected() -> Result<()> {
    let (manager, transport, faults) = mock_manager(quiet_mock());
    manager.start("assistant-1").await?;
    let session = manager.current_session().expect("active session");

    let err = manager.start("assistant-2").await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidState { .. }));
    let current = manager.current_session().expect("still held");
    assert!(Arc::ptr_eq(&session, &current));
    assert_eq!(current.state(), SessionState::Active);
    assert_eq!(transport.connect_calls(), 1);
    assert_eq!(faults.recent()[0].context, "Invalid call state");

    manager.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_start_is_rejected() {
    let config = MockTransportConfig {
        connect_delay: Duration::from_millis(500),
        ..quiet_mock()
    };
    let (manager, transport, _) = mock_manager(config);

    let (first, second) = tokio::join!(manager.start("assistant-1"), async {
        tokio::task::yield_now().await;
        manager.start("assistant-1").await
    });

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(SessionError::InvalidState {
            state: SessionState::Starting,
            ..
        })
    ));
    assert!(manager.is_call_active());
    assert_eq!(transport.connect_calls(), 1);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_start_discards_connection() {
    let config = MockTransportConfig {
        connect_delay: Duration::from_millis(1000),
        ..Default::default()
    };
    let (manager, transport, _) = mock_manager(config);

    let (started, stopped) = tokio::join!(manager.start("assistant-1"), async {
        tokio::task::yield_now().await;
        assert!(manager.is_loading());
        manager.stop().await
    });

    assert!(stopped);
    assert!(matches!(started, Err(SessionError::Aborted)));
    assert!(!manager.is_call_active());
    assert!(!manager.is_loading());
    assert!(manager.current_session().is_none());
    assert!(manager.transcript().is_empty());
    assert!(!transport.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_restart_rejected_until_stopped_start_resolves() -> Result<()> {
    let config = MockTransportConfig {
        connect_delay: Duration::from_millis(1000),
        ..Default::default()
    };
    let (manager, transport, _) = mock_manager(config);

    let (first, stopped, second) = tokio::join!(
        manager.start("assistant-1"),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            manager.stop().await
        },
        async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let result = manager.start("assistant-2").await;
            assert!(manager.is_loading());
            result
        }
    );

    assert!(matches!(first, Err(SessionError::Aborted)));
    assert!(stopped);
    assert!(matches!(
        second,
        Err(SessionError::InvalidState {
            operation: "start",
            state: SessionState::Starting,
        })
    ));
    assert!(!manager.is_loading());
    assert!(!transport.is_connected());
    assert_eq!(transport.connect_calls(), 1);

    manager.start("assistant-2").await?;

    let transcript = manager.transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transport.connect_calls(), 2);
    assert!(transport.is_connected());
    assert_eq!(transport.assistant_id().as_deref(), Some("assistant-2"));

    manager.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_dropped_start_releases_loading_flag() -> Result<()> {
    let config = MockTransportConfig {
        connect_delay: Duration::from_secs(60),
        ..quiet_mock()
    };
    let (manager, _, _) = mock_manager(config);

    let pending = tokio::time::timeout(Duration::from_millis(10), manager.start("assistant-1")).await;

    assert!(pending.is_err());
    assert!(!manager.is_loading());
    Ok(())
}

#[tokio::test]
async fn test_transport_creation_failure_sets_error() {
    let faults = Arc::new(FaultLog::default());
    let factory = || -> anyhow::Result<Arc<dyn Transport>> { anyhow::bail!("no API key configured") };
    let manager = SessionManager::new(Arc::new(factory), faults.clone());

    let err = manager.start("assistant-1").await.unwrap_err();

    assert!(matches!(err, SessionError::Init(_)));
    assert!(manager.current_session().is_none());

    let status = manager.status();
    assert!(!status.loading);
    assert!(!status.is_call_active);
    assert!(status.error.unwrap().contains("no API key configured"));
    assert_eq!(faults.recent()[0].context, "Failed to start the voice call");
}

#[tokio::test]
async fn test_connect_failure_releases_session() {
    let config = MockTransportConfig {
        fail_connect: true,
        ..quiet_mock()
    };
    let (manager, _, faults) = mock_manager(config);

    let err = manager.start("assistant-1").await.unwrap_err();

    assert!(matches!(err, SessionError::Init(_)));
    assert!(manager.current_session().is_none());
    assert!(manager.last_error().is_some());
    assert!(!manager.is_loading());
    assert_eq!(faults.len(), 1);
}

#[tokio::test]
async fn test_stop_without_call_is_quiet() {
    let (manager, transport, faults) = mock_manager(quiet_mock());

    assert!(!manager.stop().await);
    assert!(!manager.stop().await);
    assert_eq!(transport.disconnect_calls(), 0);
    assert!(faults.is_empty());
}

#[tokio::test]
async fn test_send_text_without_call_is_not_active() {
    let (manager, _, faults) = mock_manager(quiet_mock());

    let err = manager.send_text("hello").await.unwrap_err();

    assert!(matches!(err, SessionError::NotActive { .. }));
    assert_eq!(faults.recent()[0].context, "No active call");
}

#[tokio::test]
async fn test_send_text_round_trip() -> Result<()> {
    let config = MockTransportConfig {
        replies: vec!["Please describe what happened.".to_string()],
        ..quiet_mock()
    };
    let (manager, _, _) = mock_manager(config);
    manager.start("assistant-1").await?;

    manager.send_text("I saw something").await?;

    let status = manager.status();
    assert_eq!(status.transcript.len(), 2);
    assert_eq!(status.turn_state, TurnState::AssistantSpeaking);
    assert_eq!(status.state, Some(SessionState::Active));

    manager.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_transcript_retained_after_stop_by_default() -> Result<()> {
    let (manager, transport, _) = mock_manager(quiet_mock());
    manager.start("assistant-1").await?;
    transport.inject(TranscriptEntry::assistant("Hello"));
    manager.stop().await;

    assert!(manager.current_session().is_none());
    assert_eq!(manager.transcript(), vec![TranscriptEntry::assistant("Hello")]);
    assert_eq!(manager.status().turn_state, TurnState::Idle);
    Ok(())
}

#[tokio::test]
async fn test_transcript_cleared_after_stop_when_configured() -> Result<()> {
    let faults = Arc::new(FaultLog::default());
    let transport = Arc::new(MockTransport::new(quiet_mock(), faults.clone()));
    let shared = Arc::clone(&transport);
    let factory = move || -> anyhow::Result<Arc<dyn Transport>> {
        Ok(Arc::clone(&shared) as Arc<dyn Transport>)
    };
    let manager = SessionManager::new(Arc::new(factory), faults)
        .with_retention(TranscriptRetention::Clear);

    manager.start("assistant-1").await?;
    transport.inject(TranscriptEntry::assistant("Hello"));
    manager.stop().await;

    assert!(manager.transcript().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_new_call_after_stop_gets_new_session() -> Result<()> {
    let (manager, transport, _) = mock_manager(quiet_mock());

    manager.start("assistant-1").await?;
    let first = manager.current_session().expect("first session");
    transport.inject(TranscriptEntry::assistant("first call"));
    manager.stop().await;

    manager.start("assistant-1").await?;
    let second = manager.current_session().expect("second session");

    assert_ne!(first.id(), second.id());
    assert_eq!(first.state(), SessionState::Ended);
    assert_eq!(second.state(), SessionState::Active);
    assert!(manager.transcript().is_empty());
    assert_eq!(transport.connect_calls(), 2);

    manager.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_shutdown_stops_live_call() -> Result<()> {
    let (manager, transport, _) = mock_manager(quiet_mock());
    manager.start("assistant-1").await?;
    let session = manager.current_session().expect("active session");

    manager.shutdown().await;

    assert_eq!(session.state(), SessionState::Ended);
    assert_eq!(transport.disconnect_calls(), 1);
    assert!(!transport.is_connected());
    assert!(manager.current_session().is_none());
    Ok(())
}

#[tokio::test]
async fn test_listener_registered_before_start_sees_greeting() -> Result<()> {
    let config = MockTransportConfig {
        connect_delay: Duration::ZERO,
        ..Default::default()
    };
    let (manager, _, _) = mock_manager(config);
    let seen = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&seen);
    manager.subscribe(MESSAGE_EVENT, move |entry: &TranscriptEntry| {
        assert!(entry.text.contains("whistleblower assistant"));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;
    manager.start("assistant-1").await?;

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(manager.turn_state(), TurnState::AssistantSpeaking);

    manager.stop().await;
    Ok(())
}
