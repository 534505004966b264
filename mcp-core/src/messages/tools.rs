//! Tool-related message types for MCP tool discovery and execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition advertised in a `tools/list` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique name of the tool
    pub name: String,

    /// Human-readable description of what the tool does
    pub description: String,

    /// JSON Schema for the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl Tool {
    /// Create a new tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Result payload for `tools/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListToolsResult {
    /// Available tools, in plugin registration order
    pub tools: Vec<Tool>,
}

/// Result payload for `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Content items produced by the tool
    #[serde(default)]
    pub content: Vec<Content>,

    /// Whether the call failed
    #[serde(rename = "isError")]
    pub is_error: bool,
}

/// Content item inside tool call and resource read results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Content {
    /// Plain text content
    #[serde(rename = "text")]
    Text {
        /// The text content
        text: String,
    },

    /// Image content (base64 encoded)
    #[serde(rename = "image")]
    Image {
        /// MIME type of the image
        #[serde(rename = "mimeType")]
        mime_type: String,

        /// Base64-encoded image data
        data: String,
    },

    /// Audio content (base64 encoded)
    #[serde(rename = "audio")]
    Audio {
        /// MIME type of the audio
        #[serde(rename = "mimeType")]
        mime_type: String,

        /// Base64-encoded audio data
        data: String,
    },

    /// Embedded resource content
    #[serde(rename = "resource")]
    Resource {
        /// The embedded resource record
        resource: Value,
    },
}
