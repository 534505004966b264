//! Integration tests for the legacy SSE transport.

use std::sync::Arc;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde_json::{json, Value};

use mcp_transport::{SseTransport, Transport};

/// Answer every request with an empty result; ignore notifications.
fn spawn_echo_dispatcher(transport: Arc<SseTransport>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let (len, frame) = transport.read().await.expect("read failed");
            if len == 0 {
                break;
            }
            let parsed: Value = match serde_json::from_str(&frame) {
                Ok(parsed) => parsed,
                Err(_) => continue,
            };
            if let Some(id) = parsed.get("id") {
                let response = json!({"jsonrpc": "2.0", "id": id, "result": {}});
                transport
                    .write(&response.to_string())
                    .await
                    .expect("write failed");
            }
        }
    })
}

#[tokio::test]
async fn post_before_stream_is_unavailable() {
    let transport = Arc::new(SseTransport::bind("127.0.0.1", 0).await.unwrap());
    let url = format!("http://127.0.0.1:{}", transport.port());

    let response = reqwest::Client::new()
        .post(format!("{url}/messages"))
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);

    transport.shutdown().await;
}

#[tokio::test]
async fn stream_opens_with_endpoint_event_and_carries_responses() {
    let transport = Arc::new(SseTransport::bind("127.0.0.1", 0).await.unwrap());
    let url = format!("http://127.0.0.1:{}", transport.port());
    let _dispatcher = spawn_echo_dispatcher(transport.clone());

    let client = reqwest::Client::new();
    let stream_response = client.get(format!("{url}/sse")).send().await.unwrap();
    assert_eq!(stream_response.status(), 200);
    let mut stream = stream_response.bytes_stream().eventsource();

    // Handshake first: the endpoint event names the POST target.
    let handshake = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for handshake")
        .unwrap()
        .unwrap();
    assert_eq!(handshake.event, "endpoint");
    assert!(handshake.data.starts_with("/messages?session_id="));

    // An empty POST body is rejected.
    let response = client
        .post(format!("{url}/messages"))
        .body("")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // A posted request is acknowledged and answered on the stream.
    let response = client
        .post(format!("{url}/messages"))
        .body(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["status"], json!("received"));

    let event = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for response frame")
        .unwrap()
        .unwrap();
    let payload: Value = serde_json::from_str(&event.data).unwrap();
    assert_eq!(payload["id"], json!(7));
    assert!(payload.get("result").is_some());

    transport.shutdown().await;
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let transport = Arc::new(SseTransport::bind("127.0.0.1", 0).await.unwrap());
    let url = format!("http://127.0.0.1:{}", transport.port());

    let response = reqwest::get(format!("{url}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("ok"));

    transport.shutdown().await;
}

#[tokio::test]
async fn read_unblocks_on_shutdown() {
    let transport = Arc::new(SseTransport::bind("127.0.0.1", 0).await.unwrap());

    let reader = {
        let transport = transport.clone();
        tokio::spawn(async move { transport.read().await })
    };

    transport.shutdown().await;
    let (len, frame) = reader.await.unwrap().unwrap();
    assert_eq!(len, 0);
    assert!(frame.is_empty());
}
