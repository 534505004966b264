//! Transport layer for the MCP host.
//!
//! This crate provides a unified interface over the three ways a client can
//! reach the host:
//!
//! - **stdio**: newline-delimited JSON over standard input/output
//! - **SSE** (legacy): POST ingress on `/messages`, event stream on `/sse`
//! - **HTTP stream**: bidirectional streamable HTTP on `/mcp` with session
//!   tracking and server-to-client push
//!
//! The dispatch loop only sees the [`Transport`] trait: it pulls one framed
//! JSON message per `read` call and pushes serialized responses and
//! notifications through `write`. Each transport serialises concurrent
//! writes internally, so `write` is safe to call from the dispatch loop and
//! the notification pump at the same time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

pub mod http_stream;
pub mod sse;
pub mod stdio;

pub use http_stream::HttpStreamTransport;
pub use sse::SseTransport;
pub use stdio::StdioTransport;

use async_trait::async_trait;
use mcp_core::McpResult;

/// Uniform frame-oriented interface over all host transports.
///
/// `read` blocks until one complete JSON-RPC frame is available or the
/// transport is stopping, in which case it returns `(0, "")`. Awaiting
/// `read` on the current task is the synchronous dispatch mode; spawning a
/// task that awaits it is the asynchronous mode.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read the next frame. Returns `(length, payload)`; `(0, "")` signals
    /// that the transport has stopped or the peer disconnected.
    async fn read(&self) -> McpResult<(usize, String)>;

    /// Write one serialized JSON message to the client.
    ///
    /// Safe to call from any task; writes are serialised internally.
    async fn write(&self, payload: &str) -> McpResult<()>;

    /// Short transport name ("stdio", "sse", "http-stream").
    fn name(&self) -> &'static str;

    /// Transport implementation version.
    fn version(&self) -> &'static str;

    /// Listening port, or 0 when not applicable.
    fn port(&self) -> u16;

    /// Stop the transport: unblock pending reads and tear down any server.
    async fn shutdown(&self);
}
