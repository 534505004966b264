//! Stable C ABI contract between the MCP host and its plugins.
//!
//! Plugins are shared libraries discovered at process start. Each one
//! exports exactly two entry points:
//!
//! - [`PLUGIN_CREATE_SYMBOL`] (`mcp_plugin_create`): returns a
//!   [`PluginVTable`] describing the plugin and its operations
//! - [`PLUGIN_DESTROY_SYMBOL`] (`mcp_plugin_destroy`): accepts the same
//!   vtable back for teardown
//!
//! The vtable is a plain record of C strings and function pointers so the
//! boundary stays language-neutral: a plugin written in C, C++, Zig, or
//! Rust links against the same shapes. All strings crossing the boundary
//! are NUL-terminated UTF-8; the host copies what it needs at load time
//! and never retains plugin pointers past a call.
//!
//! Request dispatch is JSON-in/JSON-out: `handle_request` receives the
//! full JSON-RPC request document and returns a heap-allocated JSON
//! document that becomes the response `result`. The returned buffer is
//! owned by the plugin's allocator; the host hands it back through
//! `free_result` after copying.
//!
//! The `notifications` field is the back-channel: the host fills it after
//! load with a callback the plugin may invoke from any thread to push a
//! pre-built notification envelope to the connected client. The callback
//! becomes a no-op once the host begins shutting down.

use std::os::raw::{c_char, c_int};

/// Symbol name of the plugin constructor.
pub const PLUGIN_CREATE_SYMBOL: &[u8] = b"mcp_plugin_create";

/// Symbol name of the plugin destructor.
pub const PLUGIN_DESTROY_SYMBOL: &[u8] = b"mcp_plugin_destroy";

/// What a plugin contributes to the host.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    /// The plugin contributes tools (`tools/list`, `tools/call`)
    Tools = 0,
    /// The plugin contributes prompts (`prompts/list`, `prompts/get`)
    Prompts = 1,
    /// The plugin contributes resources (`resources/list`, `resources/read`)
    Resources = 2,
}

/// Declaration of one tool.
#[repr(C)]
pub struct ToolDesc {
    /// Tool name, unique across the process
    pub name: *const c_char,
    /// Human-readable description
    pub description: *const c_char,
    /// JSON Schema for the tool input, as a JSON text
    pub input_schema: *const c_char,
}

/// Declaration of one prompt.
#[repr(C)]
pub struct PromptDesc {
    /// Prompt name, unique across the process
    pub name: *const c_char,
    /// Human-readable description
    pub description: *const c_char,
    /// Argument descriptors, as a JSON text
    pub arguments: *const c_char,
}

/// Declaration of one resource.
#[repr(C)]
pub struct ResourceDesc {
    /// Resource name
    pub name: *const c_char,
    /// Human-readable description
    pub description: *const c_char,
    /// URI the resource is addressed by
    pub uri: *const c_char,
    /// MIME type of the resource contents
    pub mime: *const c_char,
}

/// Callback a plugin invokes to push a notification to the client.
///
/// Arguments are the plugin name and the serialized notification envelope.
pub type ClientNotificationFn = extern "C" fn(plugin_name: *const c_char, payload: *const c_char);

/// Host-provided notification back-channel.
///
/// The host allocates this record after a successful load and stores a
/// pointer to it in [`PluginVTable::notifications`]. Plugins must treat
/// the record as read-only.
#[repr(C)]
pub struct NotificationApi {
    /// Send a pre-built notification envelope to the connected client.
    pub send_to_client: Option<ClientNotificationFn>,
}

/// The descriptor vtable every plugin constructor returns.
///
/// Enumeration getters return null when the index is out of range, and
/// plugins only need to populate the getters matching their kind; the
/// host never calls `tool_at` on a Resources plugin.
#[repr(C)]
pub struct PluginVTable {
    /// Plugin name, unique within the process
    pub get_name: extern "C" fn() -> *const c_char,
    /// Plugin version string
    pub get_version: extern "C" fn() -> *const c_char,
    /// What the plugin contributes
    pub get_kind: extern "C" fn() -> PluginKind,
    /// One-time setup; nonzero means success
    pub initialize: extern "C" fn() -> c_int,
    /// JSON-RPC request in, heap JSON document out (null on refusal)
    pub handle_request: extern "C" fn(request: *const c_char) -> *mut c_char,
    /// Release a buffer previously returned by `handle_request`
    pub free_result: extern "C" fn(result: *mut c_char),
    /// One-time teardown before the destructor runs
    pub shutdown: extern "C" fn(),
    /// Number of declared tools
    pub tool_count: extern "C" fn() -> c_int,
    /// Tool declaration at `index`
    pub tool_at: extern "C" fn(index: c_int) -> *const ToolDesc,
    /// Number of declared prompts
    pub prompt_count: extern "C" fn() -> c_int,
    /// Prompt declaration at `index`
    pub prompt_at: extern "C" fn(index: c_int) -> *const PromptDesc,
    /// Number of declared resources
    pub resource_count: extern "C" fn() -> c_int,
    /// Resource declaration at `index`
    pub resource_at: extern "C" fn(index: c_int) -> *const ResourceDesc,
    /// Host-filled back-channel; null until the host attaches it
    pub notifications: *mut NotificationApi,
}

/// Signature of the exported plugin constructor.
pub type PluginCreateFn = unsafe extern "C" fn() -> *mut PluginVTable;

/// Signature of the exported plugin destructor.
pub type PluginDestroyFn = unsafe extern "C" fn(vtable: *mut PluginVTable);
