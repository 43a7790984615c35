use meetstream::transport::{ClientMessage, ServerMessage};

#[test]
fn test_start_recording_serialization() {
    let msg = ClientMessage::StartRecording {
        title: "Weekly Sync".to_string(),
        user_id: "user-42".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"type\":\"start_recording\""));
    assert!(json.contains("\"title\":\"Weekly Sync\""));
    assert!(json.contains("\"user_id\":\"user-42\""));
}

#[test]
fn test_stop_recording_serialization() {
    let json = serde_json::to_string(&ClientMessage::StopRecording).unwrap();
    assert_eq!(json, r#"{"type":"stop_recording"}"#);
}

#[test]
fn test_session_created_deserialization() {
    let json = r#"{"type":"session_created","meeting_id":"abc123"}"#;

    let msg: ServerMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        msg,
        ServerMessage::SessionCreated {
            meeting_id: "abc123".to_string()
        }
    );
}

#[test]
fn test_recording_lifecycle_deserialization() {
    let started: ServerMessage =
        serde_json::from_str(r#"{"type":"recording_started"}"#).unwrap();
    assert_eq!(started, ServerMessage::RecordingStarted);

    let stopped: ServerMessage =
        serde_json::from_str(r#"{"type":"recording_stopped"}"#).unwrap();
    assert_eq!(stopped, ServerMessage::RecordingStopped);
}

#[test]
fn test_error_message_deserialization() {
    let json = r#"{"type":"error","message":"ingest backend unavailable"}"#;

    let msg: ServerMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        msg,
        ServerMessage::Error {
            message: "ingest backend unavailable".to_string()
        }
    );
}

#[test]
fn test_unknown_message_type_is_tolerated() {
    // Newer servers may add message kinds; older clients must not choke.
    let json = r#"{"type":"speaker_diarization_ready"}"#;

    let msg: ServerMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg, ServerMessage::Unknown);
}

#[test]
fn test_extra_fields_are_tolerated() {
    let json = r#"{"type":"session_created","meeting_id":"m-1","region":"eu-west-1"}"#;

    let msg: ServerMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        msg,
        ServerMessage::SessionCreated {
            meeting_id: "m-1".to_string()
        }
    );
}
