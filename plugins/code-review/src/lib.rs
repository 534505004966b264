//! Example Prompts plugin: a `code-review` prompt template asking the LLM
//! to analyze code quality in a given language.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use mcp_plugin_api::{PluginKind, PluginVTable, PromptDesc, ResourceDesc, ToolDesc};

struct SyncPrompt(PromptDesc);
unsafe impl Sync for SyncPrompt {}

static REVIEW_PROMPT: SyncPrompt = SyncPrompt(PromptDesc {
    name: c"code-review".as_ptr(),
    description: c"Asks the LLM to analyze code quality and suggest improvements".as_ptr(),
    arguments: c"[{
        \"name\": \"language\",
        \"description\": \"The programming language of the code\",
        \"required\": true
    }]"
    .as_ptr(),
});

extern "C" fn get_name() -> *const c_char {
    c"code-review".as_ptr()
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
    if request.is_null() {
        return ptr::null_mut();
    }
    let request = unsafe { CStr::from_ptr(request) }.to_string_lossy();
    let parsed: serde_json::Value = match serde_json::from_str(&request) {
        Ok(parsed) => parsed,
        Err(_) => return ptr::null_mut(),
    };

    let Some(language) = parsed["params"]["arguments"]["language"].as_str() else {
        return ptr::null_mut();
    };

    let reply = serde_json::json!({
        "description": "this is the code review prompt",
        "messages": [{
            "role": "user",
            "content": {
                "type": "text",
                "text": format!(
                    "Please analyze code quality and suggest improvements of this code written in {language}"
                ),
            },
        }],
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
    0
}

extern "C" fn tool_at(_index: c_int) -> *const ToolDesc {
    ptr::null()
}

extern "C" fn prompt_count() -> c_int {
    1
}

extern "C" fn prompt_at(index: c_int) -> *const PromptDesc {
    if index == 0 {
        &REVIEW_PROMPT.0
    } else {
        ptr::null()
    }
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
