//! Prompt-related message types for MCP prompt discovery and retrieval.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prompt definition advertised in a `prompts/list` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique name of the prompt
    pub name: String,

    /// Human-readable description of the prompt
    pub description: String,

    /// Argument descriptors, as declared by the owning plugin
    pub arguments: Value,
}

impl Prompt {
    /// Create a new prompt definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arguments,
        }
    }
}

/// Result payload for `prompts/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListPromptsResult {
    /// Available prompts, in plugin registration order
    pub prompts: Vec<Prompt>,
}
