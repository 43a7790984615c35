use meetstream::session::{format_duration, ErrorInfo, ErrorKind, SessionState};

#[test]
fn test_default_snapshot() {
    let state = SessionState::default();

    assert!(!state.connected);
    assert!(!state.recording);
    assert_eq!(state.session_id, None);
    assert_eq!(state.elapsed_seconds, 0);
    assert_eq!(state.last_error, None);
}

#[test]
fn test_format_duration_zero() {
    assert_eq!(format_duration(0), "00:00");
}

#[test]
fn test_format_duration_under_a_minute() {
    assert_eq!(format_duration(59), "00:59");
}

#[test]
fn test_format_duration_exact_minute() {
    assert_eq!(format_duration(60), "01:00");
}

#[test]
fn test_format_duration_mixed() {
    assert_eq!(format_duration(125), "02:05");
}

#[test]
fn test_format_duration_minutes_unbounded() {
    // Minutes are not wrapped at 60
    assert_eq!(format_duration(3661), "61:01");
}

#[test]
fn test_server_reported_error_info() {
    let info = ErrorInfo::server_reported("transcription backend down");

    assert_eq!(info.kind, ErrorKind::ServerReported);
    assert_eq!(info.message, "transcription backend down");
}

#[test]
fn test_error_kind_serializes_snake_case() {
    let info = ErrorInfo::server_reported("boom");
    let json = serde_json::to_string(&info).unwrap();

    assert!(json.contains("\"kind\":\"server_reported\""));
}

#[test]
fn test_snapshot_serializes_for_http() {
    let state = SessionState {
        connected: true,
        recording: true,
        session_id: Some("m-7".to_string()),
        elapsed_seconds: 12,
        last_error: None,
    };

    let json = serde_json::to_string(&state).unwrap();
    assert!(json.contains("\"connected\":true"));
    assert!(json.contains("\"session_id\":\"m-7\""));
    assert!(json.contains("\"elapsed_seconds\":12"));
}
