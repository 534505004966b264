//! The `mcp-server` binary: loads plugins, picks a transport, and runs the
//! dispatch loop until the client disconnects or Ctrl+C arrives.
//!
//! Logging always goes to a timestamped file under `--logs`; stdout stays
//! clean because the stdio transport owns it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use mcp_host::{install_registry_handlers, pump, PluginRegistry, Server};
use mcp_transport::{HttpStreamTransport, SseTransport, StdioTransport, Transport};

#[derive(Parser)]
#[command(name = "mcp-server")]
#[command(about = "Plugin-driven Model Context Protocol server")]
#[command(version)]
struct Cli {
    /// The name of the server
    #[arg(short, long, default_value = "mcp-server")]
    name: String,

    /// The directory where to load the plugins
    #[arg(short, long, default_value = "./plugins")]
    plugins: PathBuf,

    /// The directory where to store the logs
    #[arg(short, long, default_value = "./logs")]
    logs: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Transport to serve on
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: TransportKind,

    /// Bind address for the HTTP transports
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port for the HTTP transports
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    /// Newline-delimited JSON over stdin/stdout
    Stdio,
    /// Legacy Server-Sent-Events (`/sse` + `/messages`)
    Sse,
    /// Streamable HTTP (`/mcp`)
    HttpStream,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;
            let _ = e.print();
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                std::process::exit(0);
            }
            std::process::exit(-1);
        }
    };

    let runtime = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("mcp-server failed: {e:#}");
        std::process::exit(1);
    }
}

fn setup_logging(logs_dir: &PathBuf, verbose: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("creating log directory {}", logs_dir.display()))?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S");
    let path = logs_dir.join(format!("mcp-server_{timestamp}.log"));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("creating log file {}", path.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    setup_logging(&cli.logs, cli.verbose)?;

    let transport: Arc<dyn Transport> = match cli.transport {
        TransportKind::Stdio => Arc::new(StdioTransport::new()),
        TransportKind::Sse => Arc::new(SseTransport::bind(&cli.host, cli.port).await?),
        TransportKind::HttpStream => {
            Arc::new(HttpStreamTransport::bind(&cli.host, cli.port).await?)
        }
    };

    tracing::info!(
        "Starting {} v{} (transport: {} v{}) on port: {}",
        cli.name,
        env!("CARGO_PKG_VERSION"),
        transport.name(),
        transport.version(),
        transport.port()
    );
    tracing::info!("Press Ctrl+C to exit.");

    let mut registry = PluginRegistry::new();
    let loaded = registry.load_dir(&cli.plugins);
    tracing::info!(
        "Loaded {} plugin(s) from {}",
        loaded,
        cli.plugins.display()
    );
    registry.attach_notifications(pump::forward_to_client);

    let mut server = Server::new(cli.name.clone());
    server.set_verbose(cli.verbose);
    install_registry_handlers(&mut server, Arc::new(registry));

    tokio::select! {
        result = server.run(transport.clone()) => {
            result.context("dispatch loop failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, stopping server");
            transport.shutdown().await;
        }
    }

    tracing::info!("Server stopped.");
    Ok(())
}
