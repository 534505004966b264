//! Wires the plugin registry into the dispatcher's method table.
//!
//! The dispatcher's defaults describe an empty server; these overrides
//! make the list methods aggregate plugin declarations and route the
//! call/get/read methods to the plugin owning each name or URI.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::registry::{Dispatch, PluginRegistry};
use crate::server::Server;
use mcp_core::messages::builder;

/// Replace the six registry-facing methods with plugin-backed handlers.
pub fn install_registry_handlers(server: &mut Server, registry: Arc<PluginRegistry>) {
    let reg = registry.clone();
    server.override_method(
        "tools/list",
        Arc::new(move |request| {
            let mut response = builder::response(request);
            response["result"]["tools"] = serde_json::to_value(reg.tools()).unwrap_or_default();
            Some(response)
        }),
    );

    let reg = registry.clone();
    server.override_method(
        "tools/call",
        Arc::new(move |request| {
            let mut response = builder::response(request);
            let name = request["params"]["name"].as_str().unwrap_or_default();

            match reg.call_tool(name, request) {
                Dispatch::Output(raw) => match serde_json::from_str::<Value>(&raw) {
                    Ok(mut result) => {
                        result["isError"] = json!(false);
                        response["result"] = result;
                    }
                    Err(_) => {
                        response["result"] = json!({
                            "content": [builder::text_content("Plugin returned malformed data.")],
                            "isError": true,
                        });
                    }
                },
                Dispatch::NoOutput => {
                    tracing::error!("plugin owning tool '{}' produced no output", name);
                    response["result"] = json!({
                        "content": [builder::text_content("Plugin returned no data.")],
                        "isError": true,
                    });
                }
                Dispatch::NotFound => {
                    response["result"] = json!({
                        "content": [builder::text_content(format!("Tool '{name}' not found."))],
                        "isError": true,
                    });
                }
            }
            Some(response)
        }),
    );

    let reg = registry.clone();
    server.override_method(
        "prompts/list",
        Arc::new(move |request| {
            let mut response = builder::response(request);
            response["result"]["prompts"] = serde_json::to_value(reg.prompts()).unwrap_or_default();
            Some(response)
        }),
    );

    let reg = registry.clone();
    server.override_method(
        "prompts/get",
        Arc::new(move |request| {
            let mut response = builder::response(request);
            let name = request["params"]["name"].as_str().unwrap_or_default();

            match reg.get_prompt(name, request) {
                Dispatch::Output(raw) => match serde_json::from_str::<Value>(&raw) {
                    Ok(result) => response["result"] = result,
                    Err(_) => {
                        tracing::error!("plugin owning prompt '{}' returned malformed data", name);
                    }
                },
                Dispatch::NoOutput => {
                    tracing::error!("plugin owning prompt '{}' produced no output", name);
                }
                Dispatch::NotFound => {
                    tracing::warn!("prompts/get for unknown prompt '{}'", name);
                }
            }
            Some(response)
        }),
    );

    let reg = registry.clone();
    server.override_method(
        "resources/list",
        Arc::new(move |request| {
            let mut response = builder::response(request);
            response["result"]["resources"] =
                serde_json::to_value(reg.resources()).unwrap_or_default();
            Some(response)
        }),
    );

    let reg = registry;
    server.override_method(
        "resources/read",
        Arc::new(move |request| {
            let mut response = builder::response(request);
            let uri = request["params"]["uri"].as_str().unwrap_or_default();

            match reg.read_resource(uri, request) {
                Dispatch::Output(raw) => match serde_json::from_str::<Value>(&raw) {
                    Ok(result) => response["result"] = result,
                    Err(_) => {
                        tracing::error!("plugin owning resource '{}' returned malformed data", uri);
                    }
                },
                Dispatch::NoOutput => {
                    tracing::error!("plugin owning resource '{}' produced no output", uri);
                }
                Dispatch::NotFound => {
                    tracing::warn!("resources/read for unknown uri '{}'", uri);
                }
            }
            Some(response)
        }),
    );
}
