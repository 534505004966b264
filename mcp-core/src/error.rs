//! Error types for MCP host operations.
//!
//! This module provides error handling for everything the host does:
//! transport failures, protocol violations detected by the dispatcher, and
//! plugin loading or dispatch problems. The error system is designed to be:
//!
//! - **Informative**: clear, actionable error messages
//! - **Structured**: strongly-typed variants for programmatic handling
//! - **Transport-aware**: transport-specific error context where relevant

use thiserror::Error;

/// The main error type for all MCP host operations.
///
/// This enum covers every error condition the host can hit, from a broken
/// transport to a plugin that fails to load.
#[derive(Error, Debug)]
pub enum McpError {
    /// Transport-related errors (bind failures, broken streams, etc.)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Protocol-level errors (framing, invalid messages)
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Plugin loading and dispatch errors
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        /// The underlying serde_json error
        source: serde_json::Error,
    },

    /// IO errors (file operations, stream errors)
    #[error("IO error: {source}")]
    Io {
        #[from]
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Generic errors for cases not covered by specific variants
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

/// Transport-specific errors for the stdio, SSE, and HTTP-stream transports.
#[derive(Error, Debug, Clone)]
#[allow(missing_docs)]
pub enum TransportError {
    /// Failed to bind or start the transport
    #[error("Failed to start {transport_type} transport: {reason}")]
    StartFailed {
        transport_type: String,
        reason: String,
    },

    /// Failed to write a frame to the client
    #[error("Failed to send message via {transport_type}: {reason}")]
    SendFailed {
        transport_type: String,
        reason: String,
    },

    /// Failed to read a frame from the client
    #[error("Failed to receive message via {transport_type}: {reason}")]
    ReceiveFailed {
        transport_type: String,
        reason: String,
    },

    /// The transport has been stopped
    #[error("Transport stopped ({transport_type}): {reason}")]
    Stopped {
        transport_type: String,
        reason: String,
    },
}

/// Protocol-level errors detected by the dispatch loop.
#[derive(Error, Debug, Clone)]
#[allow(missing_docs)]
pub enum ProtocolError {
    /// Invalid JSON-RPC message format
    #[error("Invalid JSON-RPC message: {reason}")]
    InvalidJsonRpc { reason: String },

    /// Too many consecutive unparseable frames; the dispatch loop gives up
    #[error("Parser error budget exhausted after {errors} consecutive failures")]
    ParserBudgetExhausted { errors: u32 },
}

/// Plugin loading and dispatch errors.
#[derive(Error, Debug, Clone)]
#[allow(missing_docs)]
pub enum PluginError {
    /// The shared library could not be opened
    #[error("Failed to load plugin library {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// The library does not export the required entry points
    #[error("Plugin {path} does not export required entry points")]
    MissingEntryPoints { path: String },

    /// The plugin's initialize hook reported failure
    #[error("Plugin initialization failed: {path}")]
    InitializeFailed { path: String },

    /// The plugin returned a document that is not valid JSON
    #[error("Plugin '{plugin}' returned malformed data")]
    MalformedOutput { plugin: String },
}

/// Convenience type alias for Results using McpError.
pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    /// Create a new internal error with a custom message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the error category for this error, for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            McpError::Transport(_) => "transport",
            McpError::Protocol(_) => "protocol",
            McpError::Plugin(_) => "plugin",
            McpError::Serialization { .. } => "serialization",
            McpError::Io { .. } => "io",
            McpError::Internal { .. } => "internal",
        }
    }
}
