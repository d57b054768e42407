//! conduitd — self-hosted conduit server.
//!
//! Wires the broker, the axum host, and the demo `raw` endpoint together,
//! then serves until ctrl-c.

mod raw;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conduit_broker::MessageBroker;
use conduit_server::ServerState;

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "conduitd", about = "Persistent-connection WebSocket server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8081")]
    bind: SocketAddr,

    /// Directory served under /public (sample pages live here).
    #[arg(long)]
    www: Option<PathBuf>,

    /// Log filter, overriding RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let metrics = conduit_server::metrics::install_recorder();

    let broker = Arc::new(MessageBroker::new());
    let state = ServerState::new(Arc::clone(&broker))
        .with_metrics(metrics)
        .map_connection("raw", raw::factory(Arc::clone(&broker)));
    let app = conduit_server::router(Arc::new(state), args.www.as_deref());

    let listener = TcpListener::bind(args.bind).await?;
    info!(addr = %args.bind, www = ?args.www, "conduitd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(broker))
        .await?;
    Ok(())
}

/// Wait for ctrl-c, then tear the broker down so every pump resolves cleanly.
async fn shutdown(broker: Arc<MessageBroker>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
    broker.shutdown();
}
