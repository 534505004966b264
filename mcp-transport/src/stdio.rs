//! Stdio transport: newline-delimited JSON over standard streams.
//!
//! One JSON object per input line, one JSON object per output line. The
//! output lock guarantees that responses and pump-driven notifications
//! interleave only at whole-frame boundaries; nothing else may write to
//! stdout while this transport is active.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::Transport;
use mcp_core::error::TransportError;
use mcp_core::McpResult;

/// Transport over the process's standard input and output.
pub struct StdioTransport {
    stdin: Mutex<BufReader<Stdin>>,
    stdout: Mutex<Stdout>,
    stop: CancellationToken,
}

impl StdioTransport {
    /// Create a transport over this process's standard streams.
    pub fn new() -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
            stdout: Mutex::new(tokio::io::stdout()),
            stop: CancellationToken::new(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn read(&self) -> McpResult<(usize, String)> {
        let mut reader = self.stdin.lock().await;
        let mut line = String::new();

        tokio::select! {
            _ = self.stop.cancelled() => Ok((0, String::new())),
            read = reader.read_line(&mut line) => match read {
                // EOF: the client closed our stdin
                Ok(0) => {
                    tracing::info!("stdin closed (EOF), stopping transport");
                    Ok((0, String::new()))
                }
                Ok(_) => {
                    let frame = line.trim_end_matches(['\r', '\n']).to_string();
                    Ok((frame.len(), frame))
                }
                Err(e) => Err(TransportError::ReceiveFailed {
                    transport_type: "stdio".to_string(),
                    reason: e.to_string(),
                }
                .into()),
            },
        }
    }

    async fn write(&self, payload: &str) -> McpResult<()> {
        let mut stdout = self.stdout.lock().await;
        let send_failed = |e: std::io::Error| TransportError::SendFailed {
            transport_type: "stdio".to_string(),
            reason: e.to_string(),
        };

        stdout.write_all(payload.as_bytes()).await.map_err(send_failed)?;
        stdout.write_all(b"\n").await.map_err(send_failed)?;
        stdout.flush().await.map_err(send_failed)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn port(&self) -> u16 {
        0
    }

    async fn shutdown(&self) {
        self.stop.cancel();
    }
}
