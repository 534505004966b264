//! MCP message types and JSON-RPC structures.
//!
//! This module provides the type definitions the host needs to speak MCP:
//!
//! - **Core Messages**: basic JSON-RPC request/response/notification shapes
//! - **Builders**: raw-JSON envelope and content builders used by the
//!   dispatcher and the plugin back-channel
//! - **Tools / Prompts / Resources**: the item shapes aggregated from
//!   plugins for the list/call/get/read methods
//! - **Initialization**: the capability advertisement returned by
//!   `initialize`

pub mod builder;
pub mod core;
pub mod prompts;
pub mod resources;
pub mod tools;

pub use self::core::{
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
    RpcErrorCode,
};
pub use prompts::{ListPromptsResult, Prompt};
pub use resources::{ListResourcesResult, Resource};
pub use tools::{CallToolResult, Content, ListToolsResult, Tool};

use serde::{Deserialize, Serialize};

/// An always-empty capability object, serialized as `{}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EmptyCapability {}

/// Resource capabilities advertised by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCapabilities {
    /// Whether resource subscriptions are advertised
    pub subscribe: bool,
}

/// The capability set this host advertises on `initialize`.
///
/// Serializes exactly as
/// `{"tools":{},"prompts":{},"resources":{"subscribe":true},"logging":{}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tools capability (empty object)
    pub tools: EmptyCapability,

    /// Prompts capability (empty object)
    pub prompts: EmptyCapability,

    /// Resources capability
    pub resources: ResourceCapabilities,

    /// Logging capability (empty object)
    pub logging: EmptyCapability,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: EmptyCapability {},
            prompts: EmptyCapability {},
            resources: ResourceCapabilities { subscribe: true },
            logging: EmptyCapability {},
        }
    }
}

/// Server identification returned in the `initialize` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Name of the server (the host's `--name` flag)
    pub name: String,

    /// Version of the server
    pub version: String,
}

/// The `initialize` result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Protocol version, echoed from the client's request
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,

    /// Capabilities advertised by the server
    pub capabilities: ServerCapabilities,

    /// Server identification
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capabilities_exact_shape() {
        let capabilities = ServerCapabilities::default();
        let wire = serde_json::to_value(capabilities).unwrap();
        assert_eq!(
            wire,
            json!({
                "tools": {},
                "prompts": {},
                "resources": { "subscribe": true },
                "logging": {},
            })
        );
    }

    #[test]
    fn test_initialize_result_shape() {
        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo {
                name: "mcp-server".to_string(),
                version: "0.1.0".to_string(),
            },
        };
        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire["protocolVersion"], json!("2024-11-05"));
        assert_eq!(wire["serverInfo"]["name"], json!("mcp-server"));
        assert_eq!(wire["capabilities"]["resources"]["subscribe"], json!(true));
    }
}
