//! # MCP Host Engine
//!
//! `mcp-host` turns a [`Transport`](mcp_transport::Transport) and a
//! directory of plugins into a working MCP server:
//!
//! - [`registry`]: discovers plugin shared libraries, snapshots their
//!   descriptors, and dispatches tool/prompt/resource requests to the
//!   plugin that owns each name or URI
//! - [`server`]: the JSON-RPC dispatch loop with the MCP method table and
//!   the override hook
//! - [`pump`]: the single writer task that drains plugin-emitted
//!   notifications onto the active transport
//! - [`host`]: wires the registry into the dispatcher's method table
//!
//! The dispatch loop processes one request at a time; plugin calls run on
//! the blocking pool so a slow tool cannot stall the notification pump or
//! the HTTP surface.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

pub mod host;
pub mod pump;
pub mod registry;
pub mod server;

pub use host::install_registry_handlers;
pub use pump::{ClientSink, NotificationPump, PumpHandle};
pub use registry::{Dispatch, PluginDescriptor, PluginRegistry};
pub use server::{Handler, Server, ServerHandle};
