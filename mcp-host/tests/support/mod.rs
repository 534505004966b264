//! Shared test support: an in-memory transport and in-process fake plugins.

// Not every test binary uses every helper here.
#![allow(dead_code)]

use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use mcp_core::McpResult;
use mcp_plugin_api::{PluginKind, PluginVTable, PromptDesc, ResourceDesc, ToolDesc};
use mcp_transport::Transport;

/// A transport backed by channels: tests feed frames in and read frames out.
pub struct MockTransport {
    incoming: Mutex<mpsc::UnboundedReceiver<String>>,
    outgoing: mpsc::UnboundedSender<String>,
}

/// Build a mock transport plus its feed and drain endpoints.
///
/// Dropping the feed sender makes `read` return `(0, "")`, which the
/// dispatch loop treats as a client disconnect.
pub fn mock_transport() -> (
    Arc<MockTransport>,
    mpsc::UnboundedSender<String>,
    mpsc::UnboundedReceiver<String>,
) {
    let (feed_tx, feed_rx) = mpsc::unbounded_channel();
    let (drain_tx, drain_rx) = mpsc::unbounded_channel();
    let transport = Arc::new(MockTransport {
        incoming: Mutex::new(feed_rx),
        outgoing: drain_tx,
    });
    (transport, feed_tx, drain_rx)
}

#[async_trait]
impl Transport for MockTransport {
    async fn read(&self) -> McpResult<(usize, String)> {
        let mut receiver = self.incoming.lock().await;
        match receiver.recv().await {
            Some(frame) => Ok((frame.len(), frame)),
            None => Ok((0, String::new())),
        }
    }

    async fn write(&self, payload: &str) -> McpResult<()> {
        let _ = self.outgoing.send(payload.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn version(&self) -> &'static str {
        "0.0.0"
    }

    fn port(&self) -> u16 {
        0
    }

    async fn shutdown(&self) {}
}

struct SyncTool(ToolDesc);
unsafe impl Sync for SyncTool {}

struct SyncPrompt(PromptDesc);
unsafe impl Sync for SyncPrompt {}

struct SyncResource(ResourceDesc);
unsafe impl Sync for SyncResource {}

unsafe extern "C" fn destroy_vtable(vtable: *mut PluginVTable) {
    drop(Box::from_raw(vtable));
}

/// Fake Tools plugin declaring `sleep`; answers with a well-formed result.
pub mod sleep_plugin {
    use super::*;
    use std::ffi::{CStr, CString};

    static SLEEP_TOOL: SyncTool = SyncTool(ToolDesc {
        name: c"sleep".as_ptr(),
        description: c"Pauses execution for the specified number of milliseconds.".as_ptr(),
        input_schema: c"{\"type\":\"object\",\"properties\":{\"milliseconds\":{\"type\":\"number\"}},\"required\":[\"milliseconds\"]}"
            .as_ptr(),
    });

    extern "C" fn get_name() -> *const c_char {
        c"sleep-tools".as_ptr()
    }
    extern "C" fn get_version() -> *const c_char {
        c"1.0.0".as_ptr()
    }
    extern "C" fn get_kind() -> PluginKind {
        PluginKind::Tools
    }
    extern "C" fn initialize() -> c_int {
        1
    }
    extern "C" fn handle_request(request: *const c_char) -> *mut c_char {
        let request = unsafe { CStr::from_ptr(request) }.to_string_lossy();
        let parsed: serde_json::Value = serde_json::from_str(&request).unwrap();
        let ms = parsed["params"]["arguments"]["milliseconds"]
            .as_i64()
            .unwrap_or(0);
        let reply = serde_json::json!({
            "content": [{"type": "text", "text": format!("Waited for {ms} milliseconds")}],
            "isError": false,
        });
        CString::new(reply.to_string()).unwrap().into_raw()
    }
    extern "C" fn free_result(result: *mut c_char) {
        drop(unsafe { CString::from_raw(result) });
    }
    extern "C" fn shutdown() {}
    extern "C" fn tool_count() -> c_int {
        1
    }
    extern "C" fn tool_at(index: c_int) -> *const ToolDesc {
        if index == 0 {
            &SLEEP_TOOL.0
        } else {
            std::ptr::null()
        }
    }
    extern "C" fn prompt_count() -> c_int {
        0
    }
    extern "C" fn prompt_at(_: c_int) -> *const mcp_plugin_api::PromptDesc {
        std::ptr::null()
    }
    extern "C" fn resource_count() -> c_int {
        0
    }
    extern "C" fn resource_at(_: c_int) -> *const mcp_plugin_api::ResourceDesc {
        std::ptr::null()
    }

    /// Register this plugin into `registry`.
    pub fn register(registry: &mut mcp_host::PluginRegistry) {
        let vtable = Box::into_raw(Box::new(PluginVTable {
            get_name,
            get_version,
            get_kind,
            initialize,
            handle_request,
            free_result,
            shutdown,
            tool_count,
            tool_at,
            prompt_count,
            prompt_at,
            resource_count,
            resource_at,
            notifications: std::ptr::null_mut(),
        }));
        registry.register_vtable(vtable, destroy_vtable);
    }
}

/// Fake Tools plugin declaring `get_weather`; answers with malformed JSON.
pub mod weather_plugin {
    use super::*;

    static WEATHER_TOOL: SyncTool = SyncTool(ToolDesc {
        name: c"get_weather".as_ptr(),
        description: c"Returns the forecast for a location.".as_ptr(),
        input_schema: c"{\"type\":\"object\",\"properties\":{\"location\":{\"type\":\"string\"}}}"
            .as_ptr(),
    });

    extern "C" fn get_name() -> *const c_char {
        c"weather-tools".as_ptr()
    }
    extern "C" fn get_version() -> *const c_char {
        c"0.9.0".as_ptr()
    }
    extern "C" fn get_kind() -> PluginKind {
        PluginKind::Tools
    }
    extern "C" fn initialize() -> c_int {
        1
    }
    extern "C" fn handle_request(_request: *const c_char) -> *mut c_char {
        // Deliberately not JSON: exercises the malformed-output path.
        std::ffi::CString::new("this is not json").unwrap().into_raw()
    }
    extern "C" fn free_result(result: *mut c_char) {
        drop(unsafe { std::ffi::CString::from_raw(result) });
    }
    extern "C" fn shutdown() {}
    extern "C" fn tool_count() -> c_int {
        1
    }
    extern "C" fn tool_at(index: c_int) -> *const ToolDesc {
        if index == 0 {
            &WEATHER_TOOL.0
        } else {
            std::ptr::null()
        }
    }
    extern "C" fn prompt_count() -> c_int {
        0
    }
    extern "C" fn prompt_at(_: c_int) -> *const mcp_plugin_api::PromptDesc {
        std::ptr::null()
    }
    extern "C" fn resource_count() -> c_int {
        0
    }
    extern "C" fn resource_at(_: c_int) -> *const mcp_plugin_api::ResourceDesc {
        std::ptr::null()
    }

    /// Register this plugin into `registry`.
    pub fn register(registry: &mut mcp_host::PluginRegistry) {
        let vtable = Box::into_raw(Box::new(PluginVTable {
            get_name,
            get_version,
            get_kind,
            initialize,
            handle_request,
            free_result,
            shutdown,
            tool_count,
            tool_at,
            prompt_count,
            prompt_at,
            resource_count,
            resource_at,
            notifications: std::ptr::null_mut(),
        }));
        registry.register_vtable(vtable, destroy_vtable);
    }
}

/// Fake Prompts plugin declaring `code-review` (well-formed output) and
/// `broken-prompt` (malformed output).
pub mod review_plugin {
    use super::*;
    use std::ffi::{CStr, CString};

    static PROMPTS: [SyncPrompt; 2] = [
        SyncPrompt(PromptDesc {
            name: c"code-review".as_ptr(),
            description: c"Asks the LLM to analyze code quality and suggest improvements.".as_ptr(),
            arguments: c"[{\"name\":\"language\",\"description\":\"The programming language of the code\",\"required\":true}]"
                .as_ptr(),
        }),
        SyncPrompt(PromptDesc {
            name: c"broken-prompt".as_ptr(),
            description: c"Always answers with data that is not JSON.".as_ptr(),
            arguments: c"[]".as_ptr(),
        }),
    ];

    extern "C" fn get_name() -> *const c_char {
        c"review-prompts".as_ptr()
    }
    extern "C" fn get_version() -> *const c_char {
        c"1.0.0".as_ptr()
    }
    extern "C" fn get_kind() -> PluginKind {
        PluginKind::Prompts
    }
    extern "C" fn initialize() -> c_int {
        1
    }
    extern "C" fn handle_request(request: *const c_char) -> *mut c_char {
        let request = unsafe { CStr::from_ptr(request) }.to_string_lossy();
        let parsed: serde_json::Value = serde_json::from_str(&request).unwrap();

        if parsed["params"]["name"] == "broken-prompt" {
            return CString::new("this is not json").unwrap().into_raw();
        }

        let language = parsed["params"]["arguments"]["language"]
            .as_str()
            .unwrap_or("an unknown language");
        let reply = serde_json::json!({
            "description": "this is the code review prompt",
            "messages": [{
                "role": "user",
                "content": {
                    "type": "text",
                    "text": format!("Please analyze code quality and suggest improvements of this code written in {language}"),
                },
            }],
        });
        CString::new(reply.to_string()).unwrap().into_raw()
    }
    extern "C" fn free_result(result: *mut c_char) {
        drop(unsafe { CString::from_raw(result) });
    }
    extern "C" fn shutdown() {}
    extern "C" fn tool_count() -> c_int {
        0
    }
    extern "C" fn tool_at(_: c_int) -> *const ToolDesc {
        std::ptr::null()
    }
    extern "C" fn prompt_count() -> c_int {
        PROMPTS.len() as c_int
    }
    extern "C" fn prompt_at(index: c_int) -> *const PromptDesc {
        PROMPTS
            .get(index as usize)
            .map_or(std::ptr::null(), |prompt| &prompt.0)
    }
    extern "C" fn resource_count() -> c_int {
        0
    }
    extern "C" fn resource_at(_: c_int) -> *const ResourceDesc {
        std::ptr::null()
    }

    /// Register this plugin into `registry`.
    pub fn register(registry: &mut mcp_host::PluginRegistry) {
        let vtable = Box::into_raw(Box::new(PluginVTable {
            get_name,
            get_version,
            get_kind,
            initialize,
            handle_request,
            free_result,
            shutdown,
            tool_count,
            tool_at,
            prompt_count,
            prompt_at,
            resource_count,
            resource_at,
            notifications: std::ptr::null_mut(),
        }));
        registry.register_vtable(vtable, destroy_vtable);
    }
}

/// Fake Resources plugin declaring one `quote:///random` resource.
pub mod quote_plugin {
    use super::*;
    use std::ffi::{CStr, CString};

    static QUOTE_RESOURCE: SyncResource = SyncResource(ResourceDesc {
        name: c"random-quote".as_ptr(),
        description: c"A random quote.".as_ptr(),
        uri: c"quote:///random".as_ptr(),
        mime: c"text/plain".as_ptr(),
    });

    extern "C" fn get_name() -> *const c_char {
        c"quote-resources".as_ptr()
    }
    extern "C" fn get_version() -> *const c_char {
        c"1.0.0".as_ptr()
    }
    extern "C" fn get_kind() -> PluginKind {
        PluginKind::Resources
    }
    extern "C" fn initialize() -> c_int {
        1
    }
    extern "C" fn handle_request(request: *const c_char) -> *mut c_char {
        let request = unsafe { CStr::from_ptr(request) }.to_string_lossy();
        let parsed: serde_json::Value = serde_json::from_str(&request).unwrap();
        let uri = parsed["params"]["uri"].as_str().unwrap_or_default();

        let reply = serde_json::json!({
            "contents": [{
                "uri": uri,
                "mimeType": "text/plain",
                "text": "Ama e fai quel che vuoi. (S. Agostino)",
            }],
        });
        CString::new(reply.to_string()).unwrap().into_raw()
    }
    extern "C" fn free_result(result: *mut c_char) {
        drop(unsafe { CString::from_raw(result) });
    }
    extern "C" fn shutdown() {}
    extern "C" fn tool_count() -> c_int {
        0
    }
    extern "C" fn tool_at(_: c_int) -> *const ToolDesc {
        std::ptr::null()
    }
    extern "C" fn prompt_count() -> c_int {
        0
    }
    extern "C" fn prompt_at(_: c_int) -> *const PromptDesc {
        std::ptr::null()
    }
    extern "C" fn resource_count() -> c_int {
        1
    }
    extern "C" fn resource_at(index: c_int) -> *const ResourceDesc {
        if index == 0 {
            &QUOTE_RESOURCE.0
        } else {
            std::ptr::null()
        }
    }

    /// Register this plugin into `registry`.
    pub fn register(registry: &mut mcp_host::PluginRegistry) {
        let vtable = Box::into_raw(Box::new(PluginVTable {
            get_name,
            get_version,
            get_kind,
            initialize,
            handle_request,
            free_result,
            shutdown,
            tool_count,
            tool_at,
            prompt_count,
            prompt_at,
            resource_count,
            resource_at,
            notifications: std::ptr::null_mut(),
        }));
        registry.register_vtable(vtable, destroy_vtable);
    }
}
