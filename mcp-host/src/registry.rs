//! Plugin registry: discovery, descriptor snapshots, and dispatch.
//!
//! Plugins are shared libraries found by a recursive directory scan. Each
//! library exports a constructor returning a [`PluginVTable`] and a
//! destructor accepting it back. A library missing either symbol is
//! skipped and its handle released; a plugin whose `initialize` reports
//! failure is destroyed and released.
//!
//! The registry copies every descriptor string into owned Rust types at
//! load time, so the dispatcher never touches plugin memory outside a
//! `handle_request` call.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};

use libloading::Library;
use serde_json::Value;

use mcp_core::error::PluginError;
use mcp_core::messages::{Prompt, Resource, Tool};
use mcp_core::McpResult;
use mcp_plugin_api::{
    ClientNotificationFn, NotificationApi, PluginDestroyFn, PluginKind, PluginVTable,
    PLUGIN_CREATE_SYMBOL, PLUGIN_DESTROY_SYMBOL,
};

/// Owned snapshot of everything a plugin declared at load time.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    /// Plugin name, unique within the process
    pub name: String,
    /// Plugin version string
    pub version: String,
    /// What the plugin contributes
    pub kind: PluginKind,
    /// Declared tools (Tools plugins only)
    pub tools: Vec<Tool>,
    /// Declared prompts (Prompts plugins only)
    pub prompts: Vec<Prompt>,
    /// Declared resources (Resources plugins only)
    pub resources: Vec<Resource>,
}

/// Outcome of routing a request to the plugin that owns a name or URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No registered plugin declares the requested name/URI
    NotFound,
    /// The owning plugin declined to produce a document
    NoOutput,
    /// The owning plugin's raw JSON document
    Output(String),
}

struct LoadedPlugin {
    descriptor: PluginDescriptor,
    path: PathBuf,
    vtable: *mut PluginVTable,
    destroy: PluginDestroyFn,
    notifications: Option<*mut NotificationApi>,
    // None for in-process (test) registrations. Held so the code backing
    // `vtable` stays mapped for the plugin's lifetime.
    _library: Option<Library>,
}

// The plugin contract requires descriptor getters and handle_request to be
// callable from any thread. The raw pointers stay valid while `_library`
// is held, and all mutation of `notifications` happens behind &mut self.
unsafe impl Send for LoadedPlugin {}
unsafe impl Sync for LoadedPlugin {}

/// The set of loaded plugins, in discovery order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<LoadedPlugin>,
}

fn cstr_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Parse a declared JSON text, falling back to an empty object.
fn parse_declared_json(raw: &str, plugin: &str, what: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("plugin {} declared malformed {} JSON: {}", plugin, what, e);
            Value::Object(Default::default())
        }
    }
}

unsafe fn snapshot_descriptor(vtable: *mut PluginVTable) -> PluginDescriptor {
    let v = &*vtable;
    let name = cstr_to_string((v.get_name)());
    let version = cstr_to_string((v.get_version)());
    let kind = (v.get_kind)();

    let mut tools = Vec::new();
    let mut prompts = Vec::new();
    let mut resources = Vec::new();

    match kind {
        PluginKind::Tools => {
            for index in 0..(v.tool_count)() {
                let desc = (v.tool_at)(index);
                if desc.is_null() {
                    continue;
                }
                let desc = &*desc;
                let schema = cstr_to_string(desc.input_schema);
                tools.push(Tool::new(
                    cstr_to_string(desc.name),
                    cstr_to_string(desc.description),
                    parse_declared_json(&schema, &name, "input schema"),
                ));
            }
        }
        PluginKind::Prompts => {
            for index in 0..(v.prompt_count)() {
                let desc = (v.prompt_at)(index);
                if desc.is_null() {
                    continue;
                }
                let desc = &*desc;
                let arguments = cstr_to_string(desc.arguments);
                prompts.push(Prompt::new(
                    cstr_to_string(desc.name),
                    cstr_to_string(desc.description),
                    parse_declared_json(&arguments, &name, "prompt arguments"),
                ));
            }
        }
        PluginKind::Resources => {
            for index in 0..(v.resource_count)() {
                let desc = (v.resource_at)(index);
                if desc.is_null() {
                    continue;
                }
                let desc = &*desc;
                resources.push(Resource::new(
                    cstr_to_string(desc.name),
                    cstr_to_string(desc.description),
                    cstr_to_string(desc.uri),
                    cstr_to_string(desc.mime),
                ));
            }
        }
    }

    PluginDescriptor {
        name,
        version,
        kind,
        tools,
        prompts,
        resources,
    }
}

fn is_shared_library(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("so") | Some("dylib") | Some("dll")
    )
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursively scan `dir` and load every shared library found.
    ///
    /// Individual load failures are logged and skipped; the return value
    /// is the number of plugins that loaded successfully.
    pub fn load_dir(&mut self, dir: &Path) -> usize {
        let before = self.plugins.len();
        self.scan(dir);
        self.plugins.len() - before
    }

    fn scan(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("error scanning plugin directory {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.scan(&path);
            } else if is_shared_library(&path) {
                if let Err(e) = self.load_plugin(&path) {
                    tracing::error!("{}", e);
                }
            }
        }
    }

    /// Load a single plugin library.
    pub fn load_plugin(&mut self, path: &Path) -> McpResult<()> {
        let library = unsafe { Library::new(path) }.map_err(|e| PluginError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let (create, destroy) = unsafe {
            let create = library
                .get::<mcp_plugin_api::PluginCreateFn>(PLUGIN_CREATE_SYMBOL)
                .map(|symbol| *symbol);
            let destroy = library
                .get::<PluginDestroyFn>(PLUGIN_DESTROY_SYMBOL)
                .map(|symbol| *symbol);
            match (create, destroy) {
                (Ok(create), Ok(destroy)) => (create, destroy),
                // Dropping `library` releases the handle.
                _ => {
                    return Err(PluginError::MissingEntryPoints {
                        path: path.display().to_string(),
                    }
                    .into())
                }
            }
        };

        let vtable = unsafe { create() };
        if vtable.is_null() {
            return Err(PluginError::LoadFailed {
                path: path.display().to_string(),
                reason: "constructor returned null".to_string(),
            }
            .into());
        }

        if unsafe { ((*vtable).initialize)() } == 0 {
            unsafe { destroy(vtable) };
            return Err(PluginError::InitializeFailed {
                path: path.display().to_string(),
            }
            .into());
        }

        let descriptor = unsafe { snapshot_descriptor(vtable) };
        tracing::info!("Loaded plugin: {} v{}", descriptor.name, descriptor.version);

        self.plugins.push(LoadedPlugin {
            descriptor,
            path: path.to_path_buf(),
            vtable,
            destroy,
            notifications: None,
            _library: Some(library),
        });
        Ok(())
    }

    /// Descriptors in discovery order.
    pub fn plugins(&self) -> Vec<PluginDescriptor> {
        self.plugins.iter().map(|p| p.descriptor.clone()).collect()
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugins are loaded.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// All declared tools, concatenated in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.plugins
            .iter()
            .filter(|p| p.descriptor.kind == PluginKind::Tools)
            .flat_map(|p| p.descriptor.tools.iter().cloned())
            .collect()
    }

    /// All declared prompts, concatenated in registration order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.plugins
            .iter()
            .filter(|p| p.descriptor.kind == PluginKind::Prompts)
            .flat_map(|p| p.descriptor.prompts.iter().cloned())
            .collect()
    }

    /// All declared resources, concatenated in registration order.
    pub fn resources(&self) -> Vec<Resource> {
        self.plugins
            .iter()
            .filter(|p| p.descriptor.kind == PluginKind::Resources)
            .flat_map(|p| p.descriptor.resources.iter().cloned())
            .collect()
    }

    /// Route a `tools/call` to the first plugin declaring `tool`.
    pub fn call_tool(&self, tool: &str, request: &Value) -> Dispatch {
        let owner = self.plugins.iter().find(|p| {
            p.descriptor.kind == PluginKind::Tools
                && p.descriptor.tools.iter().any(|t| t.name == tool)
        });
        match owner {
            Some(plugin) => plugin.handle(request),
            None => Dispatch::NotFound,
        }
    }

    /// Route a `prompts/get` to the first plugin declaring `prompt`.
    pub fn get_prompt(&self, prompt: &str, request: &Value) -> Dispatch {
        let owner = self.plugins.iter().find(|p| {
            p.descriptor.kind == PluginKind::Prompts
                && p.descriptor.prompts.iter().any(|item| item.name == prompt)
        });
        match owner {
            Some(plugin) => plugin.handle(request),
            None => Dispatch::NotFound,
        }
    }

    /// Route a `resources/read` to the first plugin declaring `uri`.
    pub fn read_resource(&self, uri: &str, request: &Value) -> Dispatch {
        let owner = self.plugins.iter().find(|p| {
            p.descriptor.kind == PluginKind::Resources
                && p.descriptor.resources.iter().any(|item| item.uri == uri)
        });
        match owner {
            Some(plugin) => plugin.handle(request),
            None => Dispatch::NotFound,
        }
    }

    /// Hand every plugin the client notification back-channel.
    pub fn attach_notifications(&mut self, callback: ClientNotificationFn) {
        for plugin in &mut self.plugins {
            let api = Box::into_raw(Box::new(NotificationApi {
                send_to_client: Some(callback),
            }));
            unsafe { (*plugin.vtable).notifications = api };
            plugin.notifications = Some(api);
        }
    }

    /// Shut down and release every plugin, in reverse registration order.
    pub fn unload_all(&mut self) {
        while let Some(mut plugin) = self.plugins.pop() {
            tracing::info!(
                "Unloading plugin: {} ({})",
                plugin.descriptor.name,
                plugin.path.display()
            );
            unsafe {
                ((*plugin.vtable).shutdown)();
                if let Some(api) = plugin.notifications.take() {
                    (*plugin.vtable).notifications = std::ptr::null_mut();
                    drop(Box::from_raw(api));
                }
                (plugin.destroy)(plugin.vtable);
            }
            // `plugin._library` drops here, releasing the handle.
        }
    }

    /// Register an in-process vtable without a backing library.
    ///
    /// This is the seam the test suite uses; production loading always
    /// goes through [`load_plugin`](Self::load_plugin).
    #[doc(hidden)]
    pub fn register_vtable(&mut self, vtable: *mut PluginVTable, destroy: PluginDestroyFn) {
        let descriptor = unsafe { snapshot_descriptor(vtable) };
        self.plugins.push(LoadedPlugin {
            descriptor,
            path: PathBuf::from("<in-process>"),
            vtable,
            destroy,
            notifications: None,
            _library: None,
        });
    }
}

impl LoadedPlugin {
    /// Call the plugin's `handle_request` with the serialized request and
    /// copy out its reply.
    fn handle(&self, request: &Value) -> Dispatch {
        let raw = match CString::new(request.to_string()) {
            Ok(raw) => raw,
            Err(_) => return Dispatch::NoOutput,
        };

        let vtable = unsafe { &*self.vtable };
        let result = (vtable.handle_request)(raw.as_ptr());
        if result.is_null() {
            tracing::error!("Plugin {} returned no output", self.descriptor.name);
            return Dispatch::NoOutput;
        }

        let output = unsafe { CStr::from_ptr(result) }
            .to_string_lossy()
            .into_owned();
        (vtable.free_result)(result);
        Dispatch::Output(output)
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        self.unload_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::os::raw::c_int;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    // A minimal in-process Tools plugin exercising the whole vtable.

    static FREED: AtomicUsize = AtomicUsize::new(0);
    static SHUTDOWN_CALLED: AtomicBool = AtomicBool::new(false);

    struct SyncTool(mcp_plugin_api::ToolDesc);
    unsafe impl Sync for SyncTool {}

    static ECHO_TOOL: SyncTool = SyncTool(mcp_plugin_api::ToolDesc {
        name: c"echo".as_ptr(),
        description: c"Echoes the request method.".as_ptr(),
        input_schema: c"{\"type\":\"object\"}".as_ptr(),
    });

    extern "C" fn get_name() -> *const c_char {
        c"echo-tools".as_ptr()
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
        let parsed: Value = serde_json::from_str(&request).unwrap();
        let reply = json!({
            "content": [{"type": "text", "text": parsed["method"]}],
            "isError": false,
        });
        CString::new(reply.to_string()).unwrap().into_raw()
    }
    extern "C" fn free_result(result: *mut c_char) {
        FREED.fetch_add(1, Ordering::SeqCst);
        drop(unsafe { CString::from_raw(result) });
    }
    extern "C" fn shutdown() {
        SHUTDOWN_CALLED.store(true, Ordering::SeqCst);
    }
    extern "C" fn tool_count() -> c_int {
        1
    }
    extern "C" fn tool_at(index: c_int) -> *const mcp_plugin_api::ToolDesc {
        if index == 0 {
            &ECHO_TOOL.0
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

    fn make_vtable() -> *mut PluginVTable {
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
            notifications: std::ptr::null_mut(),
        }))
    }

    unsafe extern "C" fn destroy_vtable(vtable: *mut PluginVTable) {
        drop(Box::from_raw(vtable));
    }

    fn registry_with_echo() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register_vtable(make_vtable(), destroy_vtable);
        registry
    }

    #[test]
    fn test_descriptor_snapshot() {
        let registry = registry_with_echo();
        let descriptors = registry.plugins();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "echo-tools");
        assert_eq!(descriptors[0].version, "1.0.0");
        assert_eq!(descriptors[0].kind, PluginKind::Tools);
        assert_eq!(descriptors[0].tools.len(), 1);
        assert_eq!(descriptors[0].tools[0].name, "echo");
        assert_eq!(descriptors[0].tools[0].input_schema, json!({"type":"object"}));
    }

    #[test]
    fn test_tool_aggregation() {
        let registry = registry_with_echo();
        let tools = registry.tools();
        assert_eq!(tools.len(), 1);
        assert!(registry.prompts().is_empty());
        assert!(registry.resources().is_empty());
    }

    #[test]
    fn test_call_tool_dispatches_and_frees() {
        let freed_before = FREED.load(Ordering::SeqCst);
        let registry = registry_with_echo();
        let request = json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                             "params":{"name":"echo"}});

        match registry.call_tool("echo", &request) {
            Dispatch::Output(raw) => {
                let parsed: Value = serde_json::from_str(&raw).unwrap();
                assert_eq!(parsed["content"][0]["text"], json!("tools/call"));
            }
            other => panic!("unexpected dispatch: {:?}", other),
        }
        assert_eq!(FREED.load(Ordering::SeqCst), freed_before + 1);
    }

    #[test]
    fn test_unknown_tool_is_not_found() {
        let registry = registry_with_echo();
        let request = json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                             "params":{"name":"missing"}});
        assert_eq!(registry.call_tool("missing", &request), Dispatch::NotFound);
    }

    #[test]
    fn test_unload_runs_shutdown() {
        let mut registry = registry_with_echo();
        registry.unload_all();
        assert!(SHUTDOWN_CALLED.load(Ordering::SeqCst));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_scan_skips_non_libraries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.txt"), "not a plugin").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/notes.md"), "still not").unwrap();

        let mut registry = PluginRegistry::new();
        assert_eq!(registry.load_dir(dir.path()), 0);
    }

    #[test]
    fn test_load_rejects_non_plugin_library_file() {
        // A file with a library extension that is not a loadable object.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.so");
        std::fs::write(&path, "definitely not an ELF").unwrap();

        let mut registry = PluginRegistry::new();
        assert!(registry.load_plugin(&path).is_err());
        assert_eq!(registry.load_dir(dir.path()), 0);
    }
}
