mod app;
mod config;
mod handlers;
mod models;
mod state;
mod storage;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::create_app,
    config::{Config, LogFormat},
    state::AppState,
    storage::DeadlineTable,
};

/// Postboard - Users and microposts with unique emails
#[derive(Parser, Debug)]
#[command(name = "postboard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(LogFormat::from_env());

    let config = Config::from_env();

    let state = build_state(&config).await?;
    let app = create_app(state, config.request_timeout());

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "postboard=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Builds the repositories on the DynamoDB table.
#[cfg(feature = "dynamodb")]
async fn build_state(config: &Config) -> Result<AppState> {
    use crate::storage::DynamoDbTable;

    let table = DynamoDbTable::connect(
        config.table_name.clone(),
        config.region.clone(),
        config.local_endpoint.as_deref(),
    )
    .await;

    if config.local_endpoint.is_some() {
        table.ensure_table().await?;
    }

    tracing::info!(
        table = %table.table_name(),
        region = %config.region,
        strategy = %config.transfer_strategy,
        "Using DynamoDB storage"
    );

    let table = DeadlineTable::new(Arc::new(table), config.store_timeout());
    Ok(AppState::from_table(Arc::new(table), config.transfer_strategy))
}

/// Builds the repositories on an empty in-memory table.
#[cfg(not(feature = "dynamodb"))]
async fn build_state(config: &Config) -> Result<AppState> {
    use crate::storage::InMemoryTable;

    tracing::info!(
        strategy = %config.transfer_strategy,
        "Using in-memory storage"
    );

    let table = DeadlineTable::new(Arc::new(InMemoryTable::new()), config.store_timeout());
    Ok(AppState::from_table(Arc::new(table), config.transfer_strategy))
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
