//! HTTP transport construction and lifecycle checks that need no network.

use mcp_toolbus::protocol::JsonRpcRequest;
use mcp_toolbus::transport::{
    HttpEndpoint, HttpTransport, SendError, Transport, TransportError,
};

#[test]
fn endpoint_from_full_url() {
    let transport = HttpTransport::from_url("http://localhost:8000/jsonrpc").unwrap();
    assert_eq!(transport.url().as_str(), "http://localhost:8000/jsonrpc");
}

#[test]
fn endpoint_from_host_port_uses_default_path() {
    let transport = HttpTransport::from_host_port("localhost", 8000).unwrap();
    assert_eq!(transport.url().as_str(), "http://localhost:8000/jsonrpc");
}

#[test]
fn endpoint_from_host_port_with_custom_path() {
    let transport =
        HttpTransport::new(HttpEndpoint::host_port_path("localhost", 9000, "/rpc")).unwrap();
    assert_eq!(transport.url().as_str(), "http://localhost:9000/rpc");

    // A missing leading slash is normalized.
    let transport =
        HttpTransport::new(HttpEndpoint::host_port_path("localhost", 9000, "rpc")).unwrap();
    assert_eq!(transport.url().as_str(), "http://localhost:9000/rpc");
}

#[test]
fn invalid_url_is_rejected_at_construction() {
    let result = HttpTransport::from_url("not a url");
    assert!(matches!(result, Err(TransportError::HttpRequest(_))));
}

#[tokio::test]
async fn send_before_initialize_is_a_transport_error() {
    let transport = HttpTransport::from_url("http://localhost:8000/jsonrpc").unwrap();
    let err = transport
        .send(JsonRpcRequest::new("ping"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SendError::Transport(TransportError::NotInitialized(_))
    ));
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let mut transport = HttpTransport::from_url("http://localhost:8000/jsonrpc").unwrap();
    transport.initialize().await.unwrap();
    transport.shutdown().await.unwrap();
    transport.shutdown().await.unwrap();

    let err = transport
        .send(JsonRpcRequest::new("ping"))
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Transport(_)));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    // Port 9 on localhost is expected to refuse connections.
    let mut transport = HttpTransport::from_url("http://127.0.0.1:9/jsonrpc")
        .unwrap()
        .with_timeout(std::time::Duration::from_millis(500));
    transport.initialize().await.unwrap();

    let err = transport
        .send(JsonRpcRequest::new("ping").with_id(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SendError::Transport(TransportError::HttpRequest(_))
    ));
}
