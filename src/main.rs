use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use meetstream::capture::{CaptureBackendFactory, CaptureConfig, CaptureSource};
use meetstream::session::{Identity, SessionConfig, SessionController};
use meetstream::transport::{is_secure_endpoint, WebSocketFactory};
use meetstream::{create_router, AppState, Config};

#[derive(Debug, Parser)]
#[command(name = "meetstream", about = "Meeting recording session controller")]
struct Cli {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/meetstream")]
    config: String,

    /// Override the ingestion endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Override the authenticated user id
    #[arg(long)]
    user_id: Option<String>,

    /// Replay a WAV file instead of capturing the microphone
    #[arg(long)]
    replay: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let endpoint = cli.endpoint.unwrap_or(cfg.ingest.url);
    let user_id = cli.user_id.or(cfg.identity.user_id);

    let secure = match Url::parse(&endpoint) {
        Ok(url) => is_secure_endpoint(&url),
        Err(e) => {
            warn!("Ingestion endpoint `{}` did not parse: {}", endpoint, e);
            false
        }
    };
    if !secure {
        warn!(
            "Ingestion endpoint {} is not a secure context; capture will be refused",
            endpoint
        );
    }

    let capture_config = CaptureConfig {
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
        echo_cancellation: cfg.audio.echo_cancellation,
        noise_suppression: cfg.audio.noise_suppression,
        auto_gain_control: cfg.audio.auto_gain_control,
    };
    let source = match cli.replay {
        Some(path) => CaptureSource::File(path),
        None => CaptureSource::Microphone,
    };

    let session_config = SessionConfig {
        identity: user_id.map(|user_id| Identity { user_id }),
        capture: capture_config.clone(),
        chunk_interval: Duration::from_millis(cfg.audio.chunk_interval_ms),
    };

    // The controller is an explicit instance owned here, injected into the
    // HTTP boundary; its lifecycle ends with the process.
    let controller = SessionController::new(
        session_config,
        Arc::new(CaptureBackendFactory::new(source, capture_config, secure)),
        Arc::new(WebSocketFactory::new(endpoint)),
    );

    let router = create_router(AppState::new(controller.clone()));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP control surface listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.destroy().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown requested");
}
