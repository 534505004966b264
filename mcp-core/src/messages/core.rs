//! Core JSON-RPC 2.0 message structures for MCP communication.
//!
//! These types strictly follow the JSON-RPC 2.0 specification with
//! MCP-specific conventions layered on top.
//!
//! # Message Types
//!
//! - **Request**: client-to-server messages expecting a response
//! - **Response**: server-to-client messages in reply to requests
//! - **Notification**: one-way messages that don't expect responses
//! - **Error**: error payloads for failed requests
//!
//! # Examples
//!
//! ```rust
//! use mcp_core::messages::{JsonRpcResponse, JsonRpcError};
//! use serde_json::json;
//!
//! let ok = JsonRpcResponse::success(1i64, json!({"status": "ok"}));
//! let err = JsonRpcResponse::error("2", JsonRpcError::method_not_found());
//! assert!(ok.is_success());
//! assert!(err.is_error());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard JSON-RPC / MCP error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RpcErrorCode {
    /// The JSON could not be parsed (-32700)
    ParseError = -32700,
    /// The request object is not a valid JSON-RPC request (-32600)
    InvalidRequest = -32600,
    /// The requested method does not exist (-32601)
    MethodNotFound = -32601,
    /// The method parameters are invalid (-32602)
    InvalidParams = -32602,
    /// Internal server error (-32603)
    InternalError = -32603,
}

impl RpcErrorCode {
    /// The numeric wire value of this code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// The canonical message for this code.
    pub fn message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// Request ID for JSON-RPC messages.
///
/// Can be a string, number, or null according to the JSON-RPC 2.0
/// specification. The dispatcher preserves the client-provided variant
/// verbatim on every response, including error responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String identifier
    String(String),
    /// Numeric identifier
    Number(i64),
    /// Null identifier (used when a malformed request carried no id)
    Null,
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// JSON-RPC 2.0 request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,

    /// Unique identifier for request/response correlation
    pub id: RequestId,

    /// Method name being invoked
    pub method: String,

    /// Parameters for the method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request with the given ID, method, and parameters.
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            method: method.into(),
            params: Some(params),
        }
    }

    /// Create a new JSON-RPC request without parameters.
    pub fn without_params(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    /// Get the parameters deserialized as a specific type.
    pub fn params_as<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        match &self.params {
            Some(params) => serde_json::from_value(params.clone()),
            None => serde_json::from_value(Value::Null),
        }
    }
}

/// JSON-RPC 2.0 response message.
///
/// Carries either a successful result or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,

    /// ID from the corresponding request
    pub id: RequestId,

    /// Success result (mutually exclusive with error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error result (mutually exclusive with result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a successful response with the given result.
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response with the given error.
    pub fn error(id: impl Into<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }

    /// Check if this response represents a success.
    pub fn is_success(&self) -> bool {
        self.result.is_some() && self.error.is_none()
    }

    /// Check if this response represents an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// JSON-RPC 2.0 notification message.
///
/// One-way; the recipient must never reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,

    /// Method name being invoked
    pub method: String,

    /// Parameters for the method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC notification with the given method and parameters.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params: Some(params),
        }
    }

    /// Create a new JSON-RPC notification without parameters.
    pub fn without_params(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params: None,
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code
    pub code: i32,

    /// Human-readable error message
    pub message: String,

    /// Additional error data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new JSON-RPC error.
    pub fn new(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// Create an error from a standard code, with its canonical message.
    pub fn from_code(code: RpcErrorCode) -> Self {
        Self::new(code.code(), code.message(), None)
    }

    /// Create a "Parse error" (-32700).
    pub fn parse_error() -> Self {
        Self::from_code(RpcErrorCode::ParseError)
    }

    /// Create an "Invalid Request" error (-32600).
    pub fn invalid_request() -> Self {
        Self::from_code(RpcErrorCode::InvalidRequest)
    }

    /// Create a "Method not found" error (-32601).
    pub fn method_not_found() -> Self {
        Self::from_code(RpcErrorCode::MethodNotFound)
    }

    /// Create an "Invalid params" error (-32602).
    pub fn invalid_params() -> Self {
        Self::from_code(RpcErrorCode::InvalidParams)
    }

    /// Create an "Internal error" (-32603).
    pub fn internal_error() -> Self {
        Self::from_code(RpcErrorCode::InternalError)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code, self.message)?;
        if let Some(data) = &self.data {
            write!(f, " ({data})")?;
        }
        Ok(())
    }
}

impl std::error::Error for JsonRpcError {}

/// Enum for any JSON-RPC message type.
///
/// Useful for generic message handling where requests, responses, and
/// notifications travel the same channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Request message
    Request(JsonRpcRequest),
    /// Notification message
    Notification(JsonRpcNotification),
    /// Response message
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// Get the method name if this is a request or notification.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(req) => Some(&req.method),
            Self::Notification(notif) => Some(&notif.method),
            Self::Response(_) => None,
        }
    }

    /// Get the request ID if this is a request or response.
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Response(resp) => Some(&resp.id),
            Self::Notification(_) => None,
        }
    }

    /// Check if this message expects a response.
    pub fn expects_response(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_creation() {
        let request = JsonRpcRequest::new(1i64, "tools/list", json!({}));

        assert_eq!(request.jsonrpc, "2.0");
        assert_eq!(request.id, RequestId::Number(1));
        assert_eq!(request.method, "tools/list");
    }

    #[test]
    fn test_success_response() {
        let response = JsonRpcResponse::success("1", json!({"result": "ok"}));

        assert!(response.is_success());
        assert!(!response.is_error());
        assert_eq!(response.id, RequestId::String("1".to_string()));
    }

    #[test]
    fn test_error_response() {
        let response = JsonRpcResponse::error(2i64, JsonRpcError::method_not_found());

        assert!(!response.is_success());
        assert!(response.is_error());
        assert_eq!(response.error.as_ref().unwrap().code, -32601);
        assert_eq!(response.error.as_ref().unwrap().message, "Method not found");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(RpcErrorCode::ParseError.code(), -32700);
        assert_eq!(RpcErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(RpcErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(RpcErrorCode::InvalidParams.code(), -32602);
        assert_eq!(RpcErrorCode::InternalError.code(), -32603);
    }

    #[test]
    fn test_request_id_preserved_verbatim() {
        // A numeric id must round-trip as a number, a string id as a string.
        let numeric: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#).unwrap();
        assert_eq!(numeric.id, RequestId::Number(7));

        let text: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"7","method":"ping"}"#).unwrap();
        assert_eq!(text.id, RequestId::String("7".to_string()));

        let response = JsonRpcResponse::success(numeric.id.clone(), json!({}));
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["id"], json!(7));
    }

    #[test]
    fn test_notification_has_no_id() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let message: JsonRpcMessage = serde_json::from_str(raw).unwrap();
        assert!(matches!(message, JsonRpcMessage::Notification(_)));
        assert!(!message.expects_response());
        assert_eq!(message.method(), Some("notifications/initialized"));
    }

    #[test]
    fn test_message_serialization_roundtrip() {
        let request = JsonRpcRequest::new("abc", "ping", json!({}));
        let json = serde_json::to_string(&request).unwrap();
        let deserialized: JsonRpcRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, deserialized);
    }

    #[test]
    fn test_response_never_carries_both() {
        let ok = JsonRpcResponse::success(1i64, json!({}));
        let wire = serde_json::to_value(&ok).unwrap();
        assert!(wire.get("result").is_some());
        assert!(wire.get("error").is_none());

        let err = JsonRpcResponse::error(1i64, JsonRpcError::internal_error());
        let wire = serde_json::to_value(&err).unwrap();
        assert!(wire.get("result").is_none());
        assert!(wire.get("error").is_some());
    }
}
