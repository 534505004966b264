//! Resource-related message types for MCP resource discovery and reading.

use serde::{Deserialize, Serialize};

/// Resource definition advertised in a `resources/list` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Human-readable name of the resource
    pub name: String,

    /// Description of the resource contents
    pub description: String,

    /// URI the resource is addressed by
    pub uri: String,

    /// MIME type of the resource contents
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl Resource {
    /// Create a new resource definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        uri: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            uri: uri.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Result payload for `resources/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListResourcesResult {
    /// Available resources, in plugin registration order
    pub resources: Vec<Resource>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_serializes_mime_type() {
        let resource = Resource::new("quote", "A random quote.", "quote://random", "text/plain");
        let wire = serde_json::to_value(&resource).unwrap();
        assert_eq!(wire["uri"], json!("quote://random"));
        assert_eq!(wire["mimeType"], json!("text/plain"));
        assert!(wire.get("mime_type").is_none());
    }
}
