//! Legacy Server-Sent-Events transport.
//!
//! Ingress is `POST /messages`; egress is the event stream opened by
//! `GET /sse`. The first frame on the stream is an `endpoint` event telling
//! the client where to POST, carrying an opaque `session_id` query
//! parameter. Responses and server-initiated notifications share the same
//! egress queue and are emitted as plain `data:` frames.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::stream::{self, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::Transport;
use mcp_core::error::TransportError;
use mcp_core::{session, McpResult};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

struct SseState {
    ingress_tx: mpsc::UnboundedSender<String>,
    ingress_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    egress_tx: std::sync::Mutex<mpsc::UnboundedSender<String>>,
    egress_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    session_id: String,
    client_connected: AtomicBool,
    stop: CancellationToken,
}

/// Legacy SSE transport bound to a local TCP port.
pub struct SseTransport {
    state: Arc<SseState>,
    local_addr: SocketAddr,
}

impl SseTransport {
    /// Bind the HTTP server and start serving the SSE surface.
    ///
    /// Pass port 0 to bind an ephemeral port; the effective port is
    /// available through [`Transport::port`].
    pub async fn bind(host: &str, port: u16) -> McpResult<Self> {
        let (ingress_tx, ingress_rx) = mpsc::unbounded_channel();
        let (egress_tx, egress_rx) = mpsc::unbounded_channel();

        let state = Arc::new(SseState {
            ingress_tx,
            ingress_rx: tokio::sync::Mutex::new(ingress_rx),
            egress_tx: std::sync::Mutex::new(egress_tx),
            egress_rx: std::sync::Mutex::new(Some(egress_rx)),
            session_id: session::generate_session_id(),
            client_connected: AtomicBool::new(false),
            stop: CancellationToken::new(),
        });

        let app = Router::new()
            .route("/sse", get(handle_sse).options(preflight))
            .route("/messages", post(handle_post_message).options(preflight))
            .route("/health", get(handle_health).options(preflight))
            .fallback(fallback)
            .with_state(state.clone());

        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| TransportError::StartFailed {
                transport_type: "sse".to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::StartFailed {
            transport_type: "sse".to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!("SSE transport listening on {}", local_addr);

        let stop = state.stop.clone();
        tokio::spawn(async move {
            let shutdown = async move { stop.cancelled().await };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("SSE server error: {}", e);
            }
        });

        Ok(Self { state, local_addr })
    }
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, x-api-key"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    headers
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, cors_headers())
}

async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        (StatusCode::OK, cors_headers()).into_response()
    } else {
        (StatusCode::NOT_FOUND, cors_headers()).into_response()
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = cors_headers();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers
}

async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        json_headers(),
        r#"{"status":"ok"}"#.to_string(),
    )
}

/// Open the event stream and hand the client its POST endpoint.
async fn handle_sse(State(state): State<Arc<SseState>>) -> Response {
    tracing::debug!("SSE client connected");

    // A reconnecting client gets a fresh egress queue; messages written
    // while no stream was open are dropped.
    let receiver = {
        let mut slot = state.egress_rx.lock().expect("egress receiver lock poisoned");
        slot.take().unwrap_or_else(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            *state.egress_tx.lock().expect("egress sender lock poisoned") = tx;
            rx
        })
    };
    state.client_connected.store(true, Ordering::SeqCst);

    let endpoint = format!("/messages?session_id={}", state.session_id);
    let handshake = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    });
    let messages = UnboundedReceiverStream::new(receiver)
        .map(|payload| Ok(Event::default().data(payload)));
    let stream: Sse<_> = Sse::new(handshake.chain(messages)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("ping"),
    );

    let mut response = stream.into_response();
    let headers = response.headers_mut();
    for (name, value) in cors_headers() {
        if let Some(name) = name {
            headers.insert(name, value);
        }
    }
    response
}

/// Accept one JSON-RPC message from the client.
async fn handle_post_message(
    State(state): State<Arc<SseState>>,
    body: String,
) -> impl IntoResponse {
    if !state.client_connected.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            json_headers(),
            r#"{"error":"No SSE connection"}"#.to_string(),
        );
    }

    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            json_headers(),
            r#"{"error":"Empty message"}"#.to_string(),
        );
    }

    tracing::debug!("Received message via POST: {}", body);
    let _ = state.ingress_tx.send(body);

    (
        StatusCode::OK,
        json_headers(),
        r#"{"status":"received"}"#.to_string(),
    )
}

#[async_trait]
impl Transport for SseTransport {
    async fn read(&self) -> McpResult<(usize, String)> {
        let mut receiver = self.state.ingress_rx.lock().await;

        tokio::select! {
            _ = self.state.stop.cancelled() => Ok((0, String::new())),
            message = receiver.recv() => match message {
                Some(message) => Ok((message.len(), message)),
                None => Ok((0, String::new())),
            },
        }
    }

    async fn write(&self, payload: &str) -> McpResult<()> {
        if !self.state.client_connected.load(Ordering::SeqCst) {
            // No open stream; the message has nowhere to go.
            tracing::debug!("dropping outbound message, no SSE client connected");
            return Ok(());
        }

        let sender = self
            .state
            .egress_tx
            .lock()
            .expect("egress sender lock poisoned")
            .clone();
        if sender.send(payload.to_string()).is_err() {
            self.state.client_connected.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sse"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn port(&self) -> u16 {
        self.local_addr.port()
    }

    async fn shutdown(&self) {
        self.state.stop.cancel();
        self.state.client_connected.store(false, Ordering::SeqCst);
    }
}
