//! Opaque session identifier generation for the HTTP transports.
//!
//! Session identifiers tie a client to one HTTP-stream transport instance
//! for the life of the conversation. They are opaque to the client; the
//! format combines a microsecond timestamp with a random suffix so that
//! identifiers are unique within the process lifetime.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a unique session identifier.
///
/// The identifier is `<hex-microsecond-timestamp>-<random-u32>`, e.g.
/// `"63f9a2b81d4c0-2593817412"`.
///
/// # Examples
///
/// ```rust
/// let a = mcp_core::session::generate_session_id();
/// let b = mcp_core::session::generate_session_id();
/// assert_ne!(a, b);
/// ```
pub fn generate_session_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let suffix: u32 = rand::thread_rng().gen();
    format!("{:x}-{}", timestamp, suffix)
}
