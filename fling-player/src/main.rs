//! Fling Player (fling-player) - Main entry point
//!
//! Runs a media session behind the HTTP/SSE control surface, driving the
//! loopback decoder.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fling_common::events::EventBus;
use fling_player::api::{self, AppContext, EventBusForwarder};
use fling_player::config::{TomlConfig, CONFIG_ENV_VAR};
use fling_player::decoder::LoopbackDecoder;
use fling_player::display::EventBusDisplay;
use fling_player::probe::HttpContentProbe;
use fling_player::volume::SoftwareVolume;
use fling_player::{Capabilities, MediaSession};

/// Event bus capacity for SSE fan-out
const EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments for fling-player
#[derive(Parser, Debug)]
#[command(name = "fling-player")]
#[command(about = "Remote-controlled media session daemon")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "FLING_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Log filter, e.g. `debug` or `fling_player=trace` (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting fling-player {} ({}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("FLING_GIT_HASH"),
        env!("FLING_BUILD_TIMESTAMP"),
        env!("FLING_BUILD_PROFILE")
    );

    let events = EventBus::new(EVENT_BUS_CAPACITY);

    let capabilities = Capabilities {
        decoder: Arc::new(LoopbackDecoder::new(config.loopback.clone())),
        display: Arc::new(EventBusDisplay::new(events.clone())),
        probe: Arc::new(
            HttpContentProbe::new(tokio::runtime::Handle::current())
                .context("Failed to create content probe")?,
        ),
        volume: Arc::new(SoftwareVolume::new(config.session.max_volume_steps)),
    };
    let session = Arc::new(
        MediaSession::new(capabilities, config.session.options())
            .context("Failed to create media session")?,
    );
    session.add_status_listener(Arc::new(EventBusForwarder::new(events.clone())));
    info!("Media session initialized");

    let ctx = AppContext {
        session: Arc::clone(&session),
        events,
    };
    api::run(&config.listen_addr(), ctx, shutdown_signal())
        .await
        .context("Server error")?;

    // Teardown joins worker threads; keep it off the async executor
    tokio::task::spawn_blocking(move || session.teardown())
        .await
        .context("Session teardown panicked")?;

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
