//! Example Tools plugin demonstrating the notification back-channel:
//! `progress_test` streams progress notifications during a long-running
//! call, `logging_test` pushes a single log message.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::time::Duration;

use mcp_core::messages::builder;
use mcp_plugin_api::{PluginKind, PluginVTable, PromptDesc, ResourceDesc, ToolDesc};

struct SyncTools([ToolDesc; 2]);
unsafe impl Sync for SyncTools {}

static TOOLS: SyncTools = SyncTools([
    ToolDesc {
        name: c"progress_test".as_ptr(),
        description: c"Execute a long running process and inform the client about the progress."
            .as_ptr(),
        input_schema: c"{
            \"$schema\": \"http://json-schema.org/draft-07/schema#\",
            \"type\": \"object\",
            \"properties\": {},
            \"required\": [],
            \"additionalProperties\": false
        }"
        .as_ptr(),
    },
    ToolDesc {
        name: c"logging_test".as_ptr(),
        description: c"Execute a logging test. Send a message from server to the client.".as_ptr(),
        input_schema: c"{
            \"$schema\": \"http://json-schema.org/draft-07/schema#\",
            \"type\": \"object\",
            \"properties\": {},
            \"required\": [],
            \"additionalProperties\": false
        }"
        .as_ptr(),
    },
]);

// The vtable the host holds; needed back here so tool calls can reach the
// host-filled notifications field.
static VTABLE: AtomicPtr<PluginVTable> = AtomicPtr::new(ptr::null_mut());

fn notify_client(payload: &str) {
    let vtable = VTABLE.load(Ordering::SeqCst);
    if vtable.is_null() {
        return;
    }
    let api = unsafe { (*vtable).notifications };
    if api.is_null() {
        return;
    }
    if let Some(send_to_client) = unsafe { (*api).send_to_client } {
        if let Ok(payload) = CString::new(payload) {
            send_to_client(get_name(), payload.as_ptr());
        }
    }
}

extern "C" fn get_name() -> *const c_char {
    c"notification-tools".as_ptr()
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

fn error_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "content": [builder::text_content(text)],
        "isError": true,
    })
}

fn run_progress_test(request: &serde_json::Value) -> serde_json::Value {
    let Some(token) = request["params"]["_meta"].get("progressToken") else {
        return error_reply("Missing required parameter: progressToken.");
    };

    let total_steps: i64 = 10;
    for step in 1..=total_steps {
        std::thread::sleep(Duration::from_secs(1));
        let percent = (step * 100) / total_steps;
        let envelope = builder::notification_progress(
            &format!("Progress: {percent}%"),
            token,
            percent,
            100,
        );
        notify_client(&envelope.to_string());
    }

    serde_json::json!({
        "content": [builder::text_content("test completed.")],
        "isError": false,
    })
}

fn run_logging_test() -> serde_json::Value {
    let envelope = builder::notification_log("notice", "****** THIS IS A LOGGING TEST!");
    notify_client(&envelope.to_string());
    std::thread::sleep(Duration::from_secs(1));

    serde_json::json!({
        "content": [builder::text_content("test completed.")],
        "isError": false,
    })
}

extern "C" fn handle_request(request: *const c_char) -> *mut c_char {
    if request.is_null() {
        return ptr::null_mut();
    }
    let request = unsafe { CStr::from_ptr(request) }.to_string_lossy();
    let parsed: serde_json::Value = match serde_json::from_str(&request) {
        Ok(parsed) => parsed,
        Err(_) => return ptr::null_mut(),
    };

    let reply = match parsed["params"]["name"].as_str() {
        Some("progress_test") => run_progress_test(&parsed),
        Some("logging_test") => run_logging_test(),
        _ => error_reply("Unknown tool."),
    };

    match CString::new(reply.to_string()) {
        Ok(reply) => reply.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

extern "C" fn free_result(result: *mut c_char) {
    if !result.is_null() {
        drop(unsafe { CString::from_raw(result) });
    }
}

extern "C" fn shutdown() {}

extern "C" fn tool_count() -> c_int {
    TOOLS.0.len() as c_int
}

extern "C" fn tool_at(index: c_int) -> *const ToolDesc {
    TOOLS.0.get(index as usize).map_or(ptr::null(), |tool| tool)
}

extern "C" fn prompt_count() -> c_int {
    0
}

extern "C" fn prompt_at(_index: c_int) -> *const PromptDesc {
    ptr::null()
}

extern "C" fn resource_count() -> c_int {
    0
}

extern "C" fn resource_at(_index: c_int) -> *const ResourceDesc {
    ptr::null()
}

/// Plugin constructor resolved by the host loader.
#[no_mangle]
pub unsafe extern "C" fn mcp_plugin_create() -> *mut PluginVTable {
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
        notifications: ptr::null_mut(),
    }));
    VTABLE.store(vtable, Ordering::SeqCst);
    vtable
}

/// Plugin destructor resolved by the host loader.
#[no_mangle]
pub unsafe extern "C" fn mcp_plugin_destroy(vtable: *mut PluginVTable) {
    VTABLE.store(ptr::null_mut(), Ordering::SeqCst);
    if !vtable.is_null() {
        drop(Box::from_raw(vtable));
    }
}
