//! Notification pump: the single writer task for out-of-band messages.
//!
//! Plugins emit notifications from arbitrary threads through the
//! back-channel callback. Those envelopes are queued here and drained by
//! one task that shares the transport's output lock with the dispatch
//! loop, so notification frames and response frames never interleave
//! mid-message.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use mcp_transport::Transport;

/// Send-capable handle bound to a running pump.
///
/// Cloneable; the plugin back-channel holds one through the process-wide
/// sink slot. Sends become no-ops once the pump begins stopping.
#[derive(Clone)]
pub struct ClientSink {
    sender: mpsc::UnboundedSender<String>,
    running: Arc<AtomicBool>,
}

impl ClientSink {
    /// Enqueue one pre-built notification envelope for delivery.
    pub fn send(&self, plugin_name: &str, payload: &str) {
        if !self.running.load(Ordering::SeqCst) {
            tracing::warn!(
                "{} attempted to send notification while server stopping",
                plugin_name
            );
            return;
        }
        tracing::debug!("notification queued from {}: {}", plugin_name, payload);
        let _ = self.sender.send(payload.to_string());
    }
}

/// The writer task draining the outbound notification queue.
pub struct NotificationPump;

/// Handle owning a running pump task.
pub struct PumpHandle {
    sink: ClientSink,
    join: JoinHandle<()>,
}

impl NotificationPump {
    /// Start the writer task on `transport`, sharing `output_lock` with
    /// the dispatch loop.
    pub fn start(
        transport: Arc<dyn Transport>,
        output_lock: Arc<Mutex<()>>,
    ) -> PumpHandle {
        let (sender, mut receiver) = mpsc::unbounded_channel::<String>();
        let running = Arc::new(AtomicBool::new(true));

        let join = tokio::spawn(async move {
            tracing::info!("notification writer started");
            while let Some(payload) = receiver.recv().await {
                {
                    let _guard = output_lock.lock().await;
                    tracing::debug!("sending notification: {}", payload);
                    if let Err(e) = transport.write(&payload).await {
                        tracing::error!("error writing notification: {}", e);
                    }
                }
                // Breather between frames; avoids a tight loop when the
                // transport is failing every write.
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            tracing::info!("notification writer stopped");
        });

        PumpHandle {
            sink: ClientSink { sender, running },
            join,
        }
    }
}

impl PumpHandle {
    /// A cloneable sink feeding this pump.
    pub fn sink(&self) -> ClientSink {
        self.sink.clone()
    }

    /// Enqueue one notification envelope unless the pump is stopping.
    pub fn send(&self, plugin_name: &str, payload: &str) {
        self.sink.send(plugin_name, payload);
    }

    /// Stop the pump: refuse new sends, let the task drain what is
    /// already queued, and join it.
    pub async fn stop(self) {
        self.sink.running.store(false, Ordering::SeqCst);
        drop(self.sink);
        let _ = self.join.await;
    }
}

// The process-wide sink the plugin back-channel forwards into. Plugins
// hold a C callback, not a Rust closure, so the binding has to go through
// a global slot; it is cleared before the pump stops.
static CLIENT_SINK: std::sync::RwLock<Option<ClientSink>> = std::sync::RwLock::new(None);

/// Bind the back-channel to a running pump.
pub fn install_client_sink(sink: ClientSink) {
    *CLIENT_SINK.write().expect("client sink lock poisoned") = Some(sink);
}

/// Invalidate the back-channel; subsequent plugin sends are no-ops.
pub fn clear_client_sink() {
    *CLIENT_SINK.write().expect("client sink lock poisoned") = None;
}

/// The callback handed to every plugin via its `NotificationApi`.
///
/// Safe to call from any plugin thread. No-ops when the host is shutting
/// down or the arguments are null.
pub extern "C" fn forward_to_client(plugin_name: *const c_char, payload: *const c_char) {
    if plugin_name.is_null() || payload.is_null() {
        return;
    }
    let plugin_name = unsafe { CStr::from_ptr(plugin_name) }.to_string_lossy();
    let payload = unsafe { CStr::from_ptr(payload) }.to_string_lossy();

    if let Some(sink) = CLIENT_SINK
        .read()
        .expect("client sink lock poisoned")
        .as_ref()
    {
        sink.send(&plugin_name, &payload);
    }
}
