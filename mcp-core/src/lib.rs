//! # MCP Core Library
//!
//! `mcp-core` provides the foundational types for hosting Model Context
//! Protocol (MCP) servers. It contains the JSON-RPC 2.0 message structures,
//! the MCP content and capability types, the envelope builders used to
//! produce responses and server-initiated notifications, and the session
//! identifier utility shared by the HTTP transports.
//!
//! ## Features
//!
//! - **Complete MCP Message Types**: JSON-RPC envelopes plus the tool,
//!   prompt, and resource item shapes advertised by the dispatcher
//! - **Envelope Builders**: canonical success/error responses, content
//!   items, and the `notifications/message` / `notifications/progress`
//!   envelopes plugins push through the back-channel
//! - **Comprehensive Error Handling**: structured error types for all
//!   failure modes, from framing errors to plugin misbehaviour
//! - **Async-First Design**: built to sit underneath tokio-driven
//!   transports and dispatch loops
//!
//! ## Architecture
//!
//! - [`error`]: error taxonomy for transport, protocol, and plugin failures
//! - [`messages`]: JSON-RPC envelope and MCP item type definitions
//! - [`session`]: opaque session identifier generation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod messages;
pub mod session;

// Re-export commonly used types for convenience
pub use error::{McpError, McpResult, PluginError, ProtocolError, TransportError};
pub use messages::{
    InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId, RpcErrorCode, ServerCapabilities, ServerInfo,
};

/// Current version of the mcp-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP protocol version advertised when the client does not request one
pub const PROTOCOL_VERSION: &str = "2024-11-05";
