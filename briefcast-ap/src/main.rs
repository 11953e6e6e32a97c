//! Briefcast Audio Player (briefcast-ap) - Main entry point
//!
//! Headless audio player for voice-synthesized topic segments: a live
//! crossfade-scheduled stream or an on-demand topic queue, controlled
//! over HTTP/SSE.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use briefcast_ap::api;
use briefcast_ap::config::PlayerConfig;
use briefcast_ap::media_session::LogMediaSession;
use briefcast_ap::player::{Player, PlayerMode};

/// Command-line arguments for briefcast-ap
#[derive(Parser, Debug)]
#[command(name = "briefcast-ap")]
#[command(about = "Headless audio player for Briefcast")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5870", env = "BRIEFCAST_AP_PORT")]
    port: u16,

    /// Live manifest URL (live streaming mode)
    #[arg(long, env = "BRIEFCAST_MANIFEST_URL", conflicts_with = "feed_url")]
    manifest_url: Option<String>,

    /// Topic feed URL (on-demand mode)
    #[arg(long, env = "BRIEFCAST_FEED_URL")]
    feed_url: Option<String>,

    /// Audio output device name (default: platform default device)
    #[arg(long, env = "BRIEFCAST_AUDIO_DEVICE")]
    audio_device: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "briefcast_ap=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let mode = match (&args.manifest_url, &args.feed_url) {
        (Some(manifest_url), None) => PlayerMode::Live {
            manifest_url: manifest_url.clone(),
        },
        (None, Some(feed_url)) => PlayerMode::OnDemand {
            feed_url: feed_url.clone(),
        },
        _ => bail!("Exactly one of --manifest-url or --feed-url is required"),
    };

    let mut config = PlayerConfig::load().context("Failed to load configuration")?;
    if args.audio_device.is_some() {
        config.audio_device = args.audio_device.clone();
    }

    info!("Starting Briefcast Audio Player on port {}", args.port);

    // Initialize the player (opens the audio output; fatal on failure)
    let player = Player::new(mode, config, Arc::new(LogMediaSession))
        .context("Failed to initialize player")?;
    info!("Player initialized");

    // Build the application router
    let app_state = api::AppState {
        player,
        port: args.port,
    };
    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
