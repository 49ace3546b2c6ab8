mod api;
mod logging;
mod metrics;
mod source;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::signal;
use tracing::{info, warn};

use chunkcast_core::{
    load_config, validate_config, ErrorReporter, ErrorStore, FfmpegTranscoder, MetricsConfig,
    ProcessingLedger, SqliteErrorStore, SqliteLedger, TaskPipeline, Transcoder,
};

use api::create_router;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    match run().await {
        // A blocked stdin read would otherwise hold up runtime shutdown.
        Ok(()) => std::process::exit(0),
        Err(e) => {
            // The subscriber may not be installed yet, so go straight to stderr.
            eprintln!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("CHUNKCAST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Initialize logging
    logging::init(&config.logging)?;

    info!(version = VERSION, "Starting chunkcast worker");
    info!("Configuration loaded from {:?}", config_path);
    info!("Database path: {:?}", config.database.path);

    // Create SQLite ledger
    let ledger: Arc<dyn ProcessingLedger> = Arc::new(
        SqliteLedger::new(&config.database.path).context("Failed to create processing ledger")?,
    );
    info!("Processing ledger initialized");

    // Create SQLite error store
    let error_store: Arc<dyn ErrorStore> = Arc::new(
        SqliteErrorStore::new(&config.database.path).context("Failed to create error store")?,
    );
    info!("Error store initialized");

    // Create transcoder
    let transcoder = FfmpegTranscoder::new(config.transcoder.clone());
    match transcoder.validate().await {
        Ok(()) => info!(
            "Using transcoder {} at {:?}",
            transcoder.name(),
            config.transcoder.ffmpeg_path
        ),
        // Tasks will fail at the transcode stage and stay eligible for redelivery.
        Err(e) => warn!(
            "Transcoder {} is not usable yet: {}",
            transcoder.name(),
            e
        ),
    }

    let pipeline = TaskPipeline::new(
        config.assembly.clone(),
        ledger,
        transcoder,
        ErrorReporter::new(error_store),
    );

    // Start health and metrics endpoint if enabled
    let server = if config.metrics.enabled {
        Some(spawn_metrics_server(&config.metrics).await?)
    } else {
        info!("Metrics endpoint disabled in config");
        None
    };

    // Consume tasks until input closes or a shutdown signal arrives
    info!("Reading tasks from stdin");
    let summary = source::consume_lines(
        BufReader::new(tokio::io::stdin()),
        &pipeline,
        shutdown_signal(),
    )
    .await
    .context("Failed to read tasks from stdin")?;

    info!(
        completed = summary.completed,
        already_processed = summary.already_processed,
        failed = summary.failed,
        "Worker stopping"
    );

    if let Some(server) = server {
        server.abort();
    }

    Ok(())
}

/// Bind the health and metrics endpoint and serve it in the background.
async fn spawn_metrics_server(config: &MetricsConfig) -> Result<tokio::task::JoinHandle<()>> {
    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Serving health and metrics on {}", addr);

    let app = create_router();
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("Metrics server error: {}", e);
        }
    }))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
