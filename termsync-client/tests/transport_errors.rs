//! Transport failures surface as typed, non-retryable errors.

use std::net::TcpListener;
use std::time::Duration;

use termsync_client::{ApiError, ClientConfig, ErrorClass, HttpClient, TermsApi};

/// A loopback port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    port
}

#[test]
fn connection_refused_is_a_transport_error() {
    let client = HttpClient::new(ClientConfig {
        api_token: Some("token".into()),
        project_id: "1".into(),
        base_url: format!("http://127.0.0.1:{}/v2", closed_port()),
        timeout: Duration::from_secs(2),
    })
    .expect("client");

    let err = client.list_terms().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got: {err:?}");
    assert_eq!(err.class(), ErrorClass::Other);
    assert!(err.to_string().contains("terms/list"));
}
