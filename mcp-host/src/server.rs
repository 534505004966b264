//! The JSON-RPC dispatch engine.
//!
//! `Server` owns the MCP method table and drives one transport: it reads
//! framed messages, resolves each method to a handler, and writes the
//! handler's response back under the shared output lock. Handlers run on
//! the blocking pool because plugin calls may block for seconds.
//!
//! Every built-in method can be replaced through [`Server::override_method`];
//! the host uses that hook to install the registry-backed list/call/get/read
//! handlers. Overriding an unknown method fails, keeping the method surface
//! fixed and auditable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::pump::{self, NotificationPump};
use mcp_core::error::ProtocolError;
use mcp_core::messages::builder;
use mcp_core::messages::{InitializeResult, RpcErrorCode, ServerCapabilities, ServerInfo};
use mcp_core::{McpResult, PROTOCOL_VERSION};
use mcp_transport::Transport;

/// Maximum consecutive parse failures tolerated before the loop exits.
const MAX_PARSER_ERRORS: u32 = 50;

/// A method handler: parsed request in, optional response document out.
///
/// Returning `None` means no frame is written, which is how notification
/// handlers stay silent.
pub type Handler = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// The MCP dispatcher.
pub struct Server {
    name: String,
    version: String,
    verbose: bool,
    handlers: HashMap<String, Handler>,
    stopping: Arc<AtomicBool>,
}

/// Handle to a server running in asynchronous mode.
pub struct ServerHandle {
    stopping: Arc<AtomicBool>,
    transport: Arc<dyn Transport>,
    join: JoinHandle<McpResult<()>>,
}

impl ServerHandle {
    /// Request a cooperative stop and wait for the dispatch loop to exit.
    pub async fn stop(self) -> McpResult<()> {
        self.stopping.store(true, Ordering::SeqCst);
        self.transport.shutdown().await;
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(mcp_core::McpError::internal(format!(
                "dispatch task panicked: {e}"
            ))),
        }
    }
}

impl Server {
    /// Create a dispatcher advertising `name` in its server info.
    pub fn new(name: impl Into<String>) -> Self {
        let mut server = Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            verbose: false,
            handlers: HashMap::new(),
            stopping: Arc::new(AtomicBool::new(false)),
        };
        server.install_builtin_handlers();
        server
    }

    /// Enable verbose request/response logging.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// The advertised server name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the handler for `method`.
    ///
    /// Returns true iff `method` already existed in the table, so a
    /// misspelled override fails loudly instead of dangling.
    pub fn override_method(&mut self, method: &str, handler: Handler) -> bool {
        match self.handlers.get_mut(method) {
            Some(slot) => {
                *slot = handler;
                true
            }
            None => false,
        }
    }

    fn install_builtin_handlers(&mut self) {
        let name = self.name.clone();
        let version = self.version.clone();
        self.register("initialize", move |request| {
            let protocol_version = request["params"]["protocolVersion"]
                .as_str()
                .unwrap_or(PROTOCOL_VERSION)
                .to_string();
            let result = InitializeResult {
                protocol_version,
                capabilities: ServerCapabilities::default(),
                server_info: ServerInfo {
                    name: name.clone(),
                    version: version.clone(),
                },
            };
            let mut response = builder::response(request);
            response["result"] = serde_json::to_value(result).unwrap_or_default();
            Some(response)
        });

        self.register("ping", |request| Some(builder::response(request)));

        self.register("tools/list", |request| {
            let mut response = builder::response(request);
            response["result"]["tools"] = json!([]);
            Some(response)
        });

        self.register("prompts/list", |request| {
            let mut response = builder::response(request);
            response["result"]["prompts"] = json!([]);
            Some(response)
        });

        self.register("resources/list", |request| {
            let mut response = builder::response(request);
            response["result"]["resources"] = json!([]);
            Some(response)
        });

        // The host replaces these with registry-backed handlers; the
        // defaults answer honestly for a plugin-less server.
        self.register("tools/call", |request| {
            let mut response = builder::response(request);
            response["result"] = json!({
                "content": [builder::text_content("No plugin provides this tool.")],
                "isError": true,
            });
            Some(response)
        });

        self.register("prompts/get", |request| {
            Some(method_not_found(request))
        });

        self.register("resources/read", |request| Some(builder::response(request)));

        // Reserved MCP methods this host does not implement yet.
        for method in [
            "resources/subscribe",
            "resources/unsubscribe",
            "logging/setLevel",
            "completion/complete",
            "roots/list",
        ] {
            self.register(method, |request| Some(method_not_found(request)));
        }

        // Inbound notifications are accepted and never answered.
        for method in [
            "notifications/initialized",
            "notifications/cancelled",
            "notifications/progress",
            "notifications/roots/list_changed",
            "notifications/resources/list_changed",
            "notifications/resources/updated",
            "notifications/prompts/list_changed",
            "notifications/tools/list_changed",
            "notifications/message",
        ] {
            self.register(method, |_request| None);
        }
    }

    fn register(
        &mut self,
        method: &str,
        handler: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) {
        self.handlers.insert(method.to_string(), Arc::new(handler));
    }

    /// Resolve `request` to a handler invocation or an immediate error.
    fn resolve(&self, request: &Value) -> Result<Handler, Value> {
        let Some(method) = request.get("method") else {
            return Err(builder::error(
                RpcErrorCode::InvalidRequest,
                request.get("id").cloned().unwrap_or(Value::Null),
                "Missing method",
            ));
        };
        let method = method.as_str().unwrap_or_default();

        match self.handlers.get(method) {
            Some(handler) => Ok(handler.clone()),
            None => Err(method_not_found(request)),
        }
    }

    async fn dispatch(&self, request: Value) -> Option<Value> {
        if self.verbose {
            tracing::debug!("=== Request START ===");
            tracing::debug!(
                "{}",
                serde_json::to_string_pretty(&request).unwrap_or_default()
            );
            tracing::debug!("=== Request END ===");
        }

        let response = match self.resolve(&request) {
            Ok(handler) => {
                // Plugin-backed handlers may block (tool calls can sleep),
                // so they never run on the runtime threads.
                tokio::task::spawn_blocking(move || handler(&request))
                    .await
                    .unwrap_or_else(|e| {
                        tracing::error!("handler panicked: {}", e);
                        None
                    })
            }
            Err(error_response) => Some(error_response),
        };

        if self.verbose {
            if let Some(response) = &response {
                tracing::debug!("=== Response START ===");
                tracing::debug!(
                    "{}",
                    serde_json::to_string_pretty(response).unwrap_or_default()
                );
                tracing::debug!("=== Response END ===");
            }
        }

        response
    }

    /// Drive the dispatch loop on the current task until the transport
    /// stops, the client disconnects, or the parser error budget runs out.
    pub async fn run(&mut self, transport: Arc<dyn Transport>) -> McpResult<()> {
        self.stopping.store(false, Ordering::SeqCst);

        let output_lock = Arc::new(Mutex::new(()));
        let pump = NotificationPump::start(transport.clone(), output_lock.clone());
        pump::install_client_sink(pump.sink());

        let mut parser_errors: u32 = 0;
        let result = loop {
            let (length, frame) = match transport.read().await {
                Ok(frame) => frame,
                Err(e) => break Err(e),
            };
            if self.stopping.load(Ordering::SeqCst) {
                break Ok(());
            }
            if length == 0 && frame.is_empty() {
                tracing::info!("transport returned empty frame, client disconnected");
                self.stopping.store(true, Ordering::SeqCst);
                break Ok(());
            }
            if frame.trim().is_empty() {
                continue;
            }

            tracing::debug!("Received: {}", frame);
            let request: Value = match serde_json::from_str(&frame) {
                Ok(request) => request,
                Err(e) => {
                    tracing::error!("Error parsing JSON: {}", e);
                    parser_errors += 1;
                    if parser_errors > MAX_PARSER_ERRORS {
                        break Err(
                            ProtocolError::ParserBudgetExhausted {
                                errors: parser_errors,
                            }
                            .into(),
                        );
                    }
                    continue;
                }
            };
            parser_errors = 0;

            if let Some(response) = self.dispatch(request).await {
                let payload = response.to_string();
                let _guard = output_lock.lock().await;
                tracing::debug!("Sending Response: {}", payload);
                if let Err(e) = transport.write(&payload).await {
                    tracing::error!("error writing response: {}", e);
                }
            }
        };

        pump::clear_client_sink();
        pump.stop().await;
        result
    }

    /// Run the dispatch loop on a spawned task (asynchronous mode).
    pub fn spawn(mut self, transport: Arc<dyn Transport>) -> ServerHandle {
        let stopping = self.stopping.clone();
        let task_transport = transport.clone();
        let join = tokio::spawn(async move { self.run(task_transport).await });
        ServerHandle {
            stopping,
            transport,
            join,
        }
    }
}

/// Build a MethodNotFound error preserving the request id verbatim.
fn method_not_found(request: &Value) -> Value {
    builder::error(
        RpcErrorCode::MethodNotFound,
        request.get("id").cloned().unwrap_or(Value::Null),
        "Method not found",
    )
}
