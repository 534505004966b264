//! Streamable HTTP transport.
//!
//! All protocol traffic flows through `/mcp`:
//!
//! - `POST` carries client requests and notifications. A request's
//!   response is returned on the same POST: the handler parks a one-shot
//!   slot keyed by the request id, queues the message for the dispatch
//!   loop, and waits until the dispatcher's `write` completes the slot or
//!   the timeout fires.
//! - `GET` opens the server-to-client SSE push stream for notifications.
//! - `DELETE` ends the session.
//!
//! A session is created by the first `initialize` POST and its id is
//! echoed in the `Mcp-Session-Id` response header; every later request
//! must present the same header.

use std::collections::HashMap;
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
use axum::routing::get;
use axum::Router;
use futures::stream::{Stream, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::Transport;
use mcp_core::error::TransportError;
use mcp_core::{session, McpResult};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Session id header, required on every request after `initialize`.
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

struct StreamState {
    ingress_tx: mpsc::UnboundedSender<String>,
    ingress_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    pending: std::sync::Mutex<HashMap<String, oneshot::Sender<String>>>,
    push_tx: std::sync::Mutex<mpsc::UnboundedSender<String>>,
    push_active: AtomicBool,
    session: std::sync::Mutex<Option<String>>,
    request_timeout: Duration,
    stop: CancellationToken,
}

impl StreamState {
    /// Complete every parked request with an empty payload; the waiting
    /// handlers answer 500.
    fn cancel_pending(&self) {
        let mut pending = self.pending.lock().expect("pending lock poisoned");
        for (_, slot) in pending.drain() {
            let _ = slot.send(String::new());
        }
    }

    fn current_session(&self) -> Option<String> {
        self.session.lock().expect("session lock poisoned").clone()
    }
}

/// Streamable HTTP transport bound to a local TCP port.
pub struct HttpStreamTransport {
    state: Arc<StreamState>,
    local_addr: SocketAddr,
}

impl HttpStreamTransport {
    /// Bind the HTTP server and start serving the `/mcp` surface.
    pub async fn bind(host: &str, port: u16) -> McpResult<Self> {
        Self::bind_with_timeout(host, port, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Bind with a custom request/response correlation timeout.
    pub async fn bind_with_timeout(
        host: &str,
        port: u16,
        request_timeout: Duration,
    ) -> McpResult<Self> {
        let (ingress_tx, ingress_rx) = mpsc::unbounded_channel();
        let (push_tx, _unused_rx) = mpsc::unbounded_channel();

        let state = Arc::new(StreamState {
            ingress_tx,
            ingress_rx: tokio::sync::Mutex::new(ingress_rx),
            pending: std::sync::Mutex::new(HashMap::new()),
            push_tx: std::sync::Mutex::new(push_tx),
            push_active: AtomicBool::new(false),
            session: std::sync::Mutex::new(None),
            request_timeout,
            stop: CancellationToken::new(),
        });

        let app = Router::new()
            .route(
                "/mcp",
                axum::routing::post(handle_post)
                    .get(handle_get_stream)
                    .delete(handle_delete)
                    .options(preflight),
            )
            .route("/health", get(handle_health).options(preflight))
            .fallback(fallback)
            .with_state(state.clone());

        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| TransportError::StartFailed {
                transport_type: "http-stream".to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::StartFailed {
            transport_type: "http-stream".to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!("HTTP stream transport listening on {}", local_addr);

        let stop = state.stop.clone();
        tokio::spawn(async move {
            let shutdown = async move { stop.cancelled().await };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("HTTP stream server error: {}", e);
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
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, Mcp-Session-Id"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Type, Mcp-Session-Id"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    headers
}

fn json_headers() -> HeaderMap {
    let mut headers = cors_headers();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        json_headers(),
        format!(r#"{{"error":"{message}"}}"#),
    )
        .into_response()
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

async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        json_headers(),
        r#"{"status":"ok"}"#.to_string(),
    )
}

/// Normalise a request id to the string key used by the pending map.
fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn validate_session(state: &StreamState, headers: &HeaderMap) -> Result<String, Response> {
    let current = state.current_session().ok_or_else(|| {
        json_error(StatusCode::NOT_FOUND, "Invalid or missing session ID")
    })?;
    let presented = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if presented != current {
        tracing::error!(
            "Invalid session ID: {} (expected: {})",
            presented,
            current
        );
        return Err(json_error(
            StatusCode::NOT_FOUND,
            "Invalid or missing session ID",
        ));
    }
    Ok(current)
}

async fn handle_post(
    State(state): State<Arc<StreamState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.contains("application/json") {
        return json_error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported Media Type. Expected application/json",
        );
    }

    if let Some(accept) = headers.get(header::ACCEPT).and_then(|value| value.to_str().ok()) {
        if !accept.contains("application/json") {
            return json_error(
                StatusCode::NOT_ACCEPTABLE,
                "Not Acceptable. Must accept application/json",
            );
        }
    }

    if body.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Empty message body");
    }

    let parsed: Value = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "Invalid JSON"),
    };

    let is_initialize = parsed.get("method").and_then(Value::as_str) == Some("initialize");

    let session_id = if is_initialize && state.current_session().is_none() {
        let id = session::generate_session_id();
        tracing::info!("Session initialized: {}", id);
        *state.session.lock().expect("session lock poisoned") = Some(id.clone());
        id
    } else {
        match validate_session(&state, &headers) {
            Ok(id) => id,
            Err(response) => return response,
        }
    };

    let mut response_headers = cors_headers();
    if let Ok(value) = HeaderValue::from_str(&session_id) {
        response_headers.insert(SESSION_HEADER, value);
    }

    // Notifications are queued and acknowledged without a body.
    let request_id = match parsed.get("id") {
        None => {
            tracing::debug!("Received notification via POST: {}", body);
            let _ = state.ingress_tx.send(body);
            return (StatusCode::ACCEPTED, response_headers).into_response();
        }
        Some(id) => id_key(id),
    };

    tracing::debug!("Received request via POST (id={}): {}", request_id, body);

    let (slot_tx, slot_rx) = oneshot::channel();
    state
        .pending
        .lock()
        .expect("pending lock poisoned")
        .insert(request_id.clone(), slot_tx);

    let _ = state.ingress_tx.send(body);

    let payload = match tokio::time::timeout(state.request_timeout, slot_rx).await {
        Ok(Ok(payload)) => payload,
        Ok(Err(_)) => String::new(),
        Err(_) => {
            tracing::error!("Request timed out (id={})", request_id);
            state
                .pending
                .lock()
                .expect("pending lock poisoned")
                .remove(&request_id);
            return json_error(StatusCode::GATEWAY_TIMEOUT, "Request timed out");
        }
    };

    if payload.is_empty() {
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    }

    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    (StatusCode::OK, response_headers, payload).into_response()
}

/// Open the server-to-client push stream.
async fn handle_get_stream(State(state): State<Arc<StreamState>>, headers: HeaderMap) -> Response {
    let session_id = match validate_session(&state, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    tracing::debug!("SSE push stream client connected");

    // Each GET gets a fresh push queue; anything queued while no stream
    // was active has already been dropped.
    let (push_tx, push_rx) = mpsc::unbounded_channel();
    *state.push_tx.lock().expect("push sender lock poisoned") = push_tx;
    state.push_active.store(true, Ordering::SeqCst);

    let events: Sse<_> = Sse::new(sse_events(push_rx)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("ping"),
    );

    let mut response = events.into_response();
    let headers_mut = response.headers_mut();
    for (name, value) in cors_headers() {
        if let Some(name) = name {
            headers_mut.insert(name, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(&session_id) {
        headers_mut.insert(SESSION_HEADER, value);
    }
    response
}

fn sse_events(
    receiver: mpsc::UnboundedReceiver<String>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    UnboundedReceiverStream::new(receiver)
        .map(|payload| Ok(Event::default().event("message").data(payload)))
}

/// End the session.
async fn handle_delete(State(state): State<Arc<StreamState>>, headers: HeaderMap) -> Response {
    let session_id = match validate_session(&state, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    tracing::info!("Session terminated by client: {}", session_id);

    *state.session.lock().expect("session lock poisoned") = None;
    state.push_active.store(false, Ordering::SeqCst);
    state.cancel_pending();

    (
        StatusCode::OK,
        json_headers(),
        r#"{"status":"session terminated"}"#.to_string(),
    )
        .into_response()
}

#[async_trait]
impl Transport for HttpStreamTransport {
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

    /// Route an outbound message: responses complete the pending slot of
    /// the POST that submitted the request; anything else is a
    /// server-initiated notification for the push stream.
    async fn write(&self, payload: &str) -> McpResult<()> {
        let parsed: Value = match serde_json::from_str(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("outbound message is not valid JSON: {}", e);
                return Ok(());
            }
        };

        let is_response = parsed.get("id").is_some()
            && (parsed.get("result").is_some() || parsed.get("error").is_some());

        if is_response {
            let key = id_key(&parsed["id"]);
            let slot = self
                .state
                .pending
                .lock()
                .expect("pending lock poisoned")
                .remove(&key);
            if let Some(slot) = slot {
                tracing::debug!("Routing response to pending request id={}", key);
                let _ = slot.send(payload.to_string());
                return Ok(());
            }
        }

        if self.state.push_active.load(Ordering::SeqCst) {
            let sender = self
                .state
                .push_tx
                .lock()
                .expect("push sender lock poisoned")
                .clone();
            if sender.send(payload.to_string()).is_err() {
                self.state.push_active.store(false, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http-stream"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn port(&self) -> u16 {
        self.local_addr.port()
    }

    async fn shutdown(&self) {
        self.state.stop.cancel();
        self.state.push_active.store(false, Ordering::SeqCst);
        self.state.cancel_pending();
    }
}
