//! Example Tools plugin: a `sleep` tool that pauses for the requested
//! number of milliseconds.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::time::Duration;

use mcp_plugin_api::{PluginKind, PluginVTable, PromptDesc, ResourceDesc, ToolDesc};

struct SyncTool(ToolDesc);
unsafe impl Sync for SyncTool {}

static SLEEP_TOOL: SyncTool = SyncTool(ToolDesc {
    name: c"sleep".as_ptr(),
    description: c"Pauses execution for the specified number of milliseconds.".as_ptr(),
    input_schema: c"{
        \"$schema\": \"http://json-schema.org/draft-07/schema#\",
        \"type\": \"object\",
        \"properties\": {
            \"milliseconds\": { \"type\": \"number\", \"minimum\": 0, \"description\": \"Number of milliseconds to sleep.\" }
        },
        \"required\": [\"milliseconds\"],
        \"additionalProperties\": false
    }"
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
    if request.is_null() {
        return ptr::null_mut();
    }
    let request = unsafe { CStr::from_ptr(request) }.to_string_lossy();
    let parsed: serde_json::Value = match serde_json::from_str(&request) {
        Ok(parsed) => parsed,
        Err(_) => return ptr::null_mut(),
    };

    let milliseconds = parsed["params"]["arguments"]["milliseconds"]
        .as_u64()
        .unwrap_or(0);
    std::thread::sleep(Duration::from_millis(milliseconds));

    let reply = serde_json::json!({
        "content": [{
            "type": "text",
            "text": format!("Waited for {milliseconds} milliseconds"),
        }],
        "isError": false,
    });

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
    1
}

extern "C" fn tool_at(index: c_int) -> *const ToolDesc {
    if index == 0 {
        &SLEEP_TOOL.0
    } else {
        ptr::null()
    }
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
    Box::into_raw(Box::new(PluginVTable {
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
    }))
}

/// Plugin destructor resolved by the host loader.
#[no_mangle]
pub unsafe extern "C" fn mcp_plugin_destroy(vtable: *mut PluginVTable) {
    if !vtable.is_null() {
        drop(Box::from_raw(vtable));
    }
}
