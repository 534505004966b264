//! Example Resources plugin: a `bacio:///quote` resource that serves a
//! random quote from the famous Bacio Perugina wrappers.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use rand::seq::SliceRandom;

use mcp_core::messages::builder;
use mcp_plugin_api::{PluginKind, PluginVTable, PromptDesc, ResourceDesc, ToolDesc};

const RESOURCE_URI: &str = "bacio:///quote";
const RESOURCE_MIME: &str = "text/plain";

static QUOTES: &[&str] = &[
    "Amor che nella mente mi ragiona cominciò egli a dir si dolcemente che la dolcezza ancor dentro mi suona. (Dante)",
    "A chi più amiamo, meno dire sappiamo. (Proverbio inglese)",
    "Al cor gentil repara sempre Amore… (G. Guinizzelli)",
    "Ama e fai quel che vuoi. (S. Agostino)",
    "Amare è gioire, mentre crediamo di gioire solo se siamo amati. (Aristotele)",
    "Amare è la metà di credere. (V.Hugo)",
    "Amare è mettere la nostra felicità nella felicità di un altro. (G.W.von Leibnitz)",
    "Amore è rivelazione improvvisa: il bacio è sempre una scoperta. (Anonimo)",
    "Amore guarda non con gli occhi ma con l'anima… (Shakespeare)",
    "Amore non è guardarsi a vicenda; è guardare insieme nella stessa direzione. (A.deSaint-Exupery)",
    "Cos'è un bacio? Nulla. Cosa può essere? Tutto. (Anonimo)",
    "Dall'amicizia all'amore c'è la distanza di un bacio. (Anonimo)",
    "E che cos'è un bacio? Un apostrofo rosa fra le parole t'amo, un segreto detto sulla bocca. (Rostand)",
    "Che l'amore è tutto, è tutto ciò che sappiamo dell'amore. (Emily Dickinson)",
];

struct SyncResource(ResourceDesc);
unsafe impl Sync for SyncResource {}

static QUOTE_RESOURCE: SyncResource = SyncResource(ResourceDesc {
    name: c"bacio-quote".as_ptr(),
    description: c"A list of the famous italian bacio perugina quotes".as_ptr(),
    uri: c"bacio:///quote".as_ptr(),
    mime: c"text/plain".as_ptr(),
});

extern "C" fn get_name() -> *const c_char {
    c"bacio-quote".as_ptr()
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
    if request.is_null() {
        return ptr::null_mut();
    }
    let request = unsafe { CStr::from_ptr(request) }.to_string_lossy();
    if serde_json::from_str::<serde_json::Value>(&request).is_err() {
        return ptr::null_mut();
    }

    let quote = QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default();

    let reply = serde_json::json!({
        "contents": [builder::resource_text(RESOURCE_URI, RESOURCE_MIME, quote)],
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
    0
}

extern "C" fn prompt_at(_index: c_int) -> *const PromptDesc {
    ptr::null()
}

extern "C" fn resource_count() -> c_int {
    1
}

extern "C" fn resource_at(index: c_int) -> *const ResourceDesc {
    if index == 0 {
        &QUOTE_RESOURCE.0
    } else {
        ptr::null()
    }
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
