//! Tests for the notification pump and the plugin back-channel plumbing.

mod support;

use std::ffi::CString;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use mcp_core::messages::builder;
use mcp_host::pump::{self, NotificationPump};
use support::mock_transport;

async fn next_frame(rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for output frame")
        .expect("output channel closed");
    serde_json::from_str(&frame).expect("output frame is not JSON")
}

#[tokio::test]
async fn notifications_drain_in_fifo_order() {
    let (transport, _feed, mut drain) = mock_transport();
    let output_lock = Arc::new(Mutex::new(()));
    let pump = NotificationPump::start(transport, output_lock);

    for progress in [25, 50, 75] {
        let envelope = builder::notification_progress("working", &json!("tok"), progress, 100);
        pump.send("demo-tools", &envelope.to_string());
    }
    pump.stop().await;

    for expected in [25, 50, 75] {
        let frame = next_frame(&mut drain).await;
        assert_eq!(frame["method"], json!("notifications/progress"));
        assert_eq!(frame["params"]["progress"], json!(expected));
        assert_eq!(frame["params"]["total"], json!(100));
        assert_eq!(frame["params"]["progressToken"], json!("tok"));
    }
}

#[tokio::test]
async fn sink_refuses_sends_after_stop() {
    let (transport, _feed, mut drain) = mock_transport();
    let output_lock = Arc::new(Mutex::new(()));
    let pump = NotificationPump::start(transport, output_lock);

    let sink = pump.sink();
    pump.stop().await;

    sink.send("demo-tools", r#"{"jsonrpc":"2.0","method":"notifications/message"}"#);
    assert!(drain.try_recv().is_err());
}

#[tokio::test]
async fn back_channel_callback_forwards_to_the_client() {
    let (transport, _feed, mut drain) = mock_transport();
    let output_lock = Arc::new(Mutex::new(()));
    let pump = NotificationPump::start(transport, output_lock);
    pump::install_client_sink(pump.sink());

    let plugin = CString::new("demo-tools").unwrap();
    let payload =
        CString::new(builder::notification_log("notice", "hello from plugin").to_string()).unwrap();
    pump::forward_to_client(plugin.as_ptr(), payload.as_ptr());

    let frame = next_frame(&mut drain).await;
    assert_eq!(frame["method"], json!("notifications/message"));
    assert_eq!(frame["params"]["data"], json!("hello from plugin"));

    // Once the sink is invalidated the callback is a no-op.
    pump::clear_client_sink();
    pump::forward_to_client(plugin.as_ptr(), payload.as_ptr());
    pump.stop().await;

    assert!(drain.try_recv().is_err());
}
