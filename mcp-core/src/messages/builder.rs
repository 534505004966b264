//! Envelope builders for responses, content items, and server-initiated
//! notifications.
//!
//! These are the raw-JSON builders the dispatcher and plugins use when a
//! message has to match the wire format exactly: a success response copies
//! the request `id` and starts from an empty `result`; an error response
//! carries `error` and never `result`; content items use the canonical MCP
//! field names.
//!
//! # Examples
//!
//! ```rust
//! use mcp_core::messages::builder;
//! use serde_json::json;
//!
//! let request = json!({"jsonrpc":"2.0","id":1,"method":"ping"});
//! let response = builder::response(&request);
//! assert_eq!(response["id"], json!(1));
//! assert_eq!(response["result"], json!({}));
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use super::core::RpcErrorCode;

/// Build a success response skeleton for `request`.
///
/// Copies the request `id` verbatim (`null` when absent) and sets
/// `result` to an empty object for the handler to fill in.
pub fn response(request: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": request.get("id").cloned().unwrap_or(Value::Null),
        "result": {},
    })
}

/// Build an error response with the given code and message.
///
/// `id` is emitted verbatim; pass `Value::Null` when the request carried
/// no usable id.
pub fn error(code: RpcErrorCode, id: Value, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": { "code": code.code(), "message": message },
        "id": id,
    })
}

/// Build a `text` content item.
pub fn text_content(text: impl Into<String>) -> Value {
    json!({ "type": "text", "text": text.into() })
}

/// Build an `image` content item with base64-encoded data.
pub fn image_content(data: &[u8], mime_type: &str) -> Value {
    json!({
        "type": "image",
        "mimeType": mime_type,
        "data": BASE64.encode(data),
    })
}

/// Build an `audio` content item with base64-encoded data.
pub fn audio_content(data: &[u8], mime_type: &str) -> Value {
    json!({
        "type": "audio",
        "mimeType": mime_type,
        "data": BASE64.encode(data),
    })
}

/// Build a textual resource record for a `resources/read` result.
pub fn resource_text(uri: &str, mime_type: &str, text: &str) -> Value {
    json!({
        "uri": uri,
        "mimeType": mime_type,
        "text": text,
    })
}

/// Build a `notifications/message` log notification envelope.
pub fn notification_log(level: &str, data: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "notifications/message",
        "params": { "level": level, "data": data },
    })
}

/// Build a `notifications/progress` notification envelope.
pub fn notification_progress(
    message: &str,
    progress_token: &Value,
    progress: i64,
    total: i64,
) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "notifications/progress",
        "params": {
            "progressToken": progress_token,
            "progress": progress,
            "total": total,
            "message": message,
        },
    })
}
