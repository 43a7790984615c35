use meetstream::error::TransportError;
use meetstream::transport::{is_secure_endpoint, WebSocketFactory};
use url::Url;

#[test]
fn test_tls_endpoint_is_secure() {
    let url = Url::parse("wss://ingest.example.com/audio").unwrap();
    assert!(is_secure_endpoint(&url));
}

#[test]
fn test_localhost_is_secure_without_tls() {
    for endpoint in [
        "ws://localhost:5001/audio",
        "ws://127.0.0.1:5001/audio",
        "ws://[::1]:5001/audio",
    ] {
        let url = Url::parse(endpoint).unwrap();
        assert!(is_secure_endpoint(&url), "{} should be secure", endpoint);
    }
}

#[test]
fn test_plain_remote_endpoint_is_not_secure() {
    let url = Url::parse("ws://ingest.example.com/audio").unwrap();
    assert!(!is_secure_endpoint(&url));
}

#[test]
fn test_session_url_carries_user_id() {
    let factory = WebSocketFactory::new("wss://ingest.example.com/audio");
    let url = factory.session_url("user-42").unwrap();

    assert_eq!(url.as_str(), "wss://ingest.example.com/audio?user_id=user-42");
}

#[test]
fn test_session_url_preserves_existing_query() {
    let factory = WebSocketFactory::new("wss://ingest.example.com/audio?codec=wav");
    let url = factory.session_url("user-42").unwrap();

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(pairs.contains(&("codec".to_string(), "wav".to_string())));
    assert!(pairs.contains(&("user_id".to_string(), "user-42".to_string())));
}

#[test]
fn test_invalid_endpoint_is_rejected() {
    let factory = WebSocketFactory::new("not a url");
    let err = factory.session_url("user-42").unwrap_err();

    assert!(matches!(err, TransportError::InvalidEndpoint { .. }));
}
