//! TV Remote Gateway - drives a TV's remote control over its secure WebSocket API.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tv_remote_gateway::{app, AppState, Config, ConnectionManager, DeviceConnector};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("tv-remote-gateway {}", VERSION);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Make sure config.toml exists or set TV_IP (or TVREMOTE__DEVICE__HOST).",
            e
        )
    })?;
    tracing::info!("Starting tv-remote-gateway {}", VERSION);
    tracing::info!("TV: {}", config.device.address());
    tracing::info!(
        "Auth token: {}",
        if config.device.seeded_token().is_some() { "will reuse" } else { "none" }
    );

    // Connect to the TV in the background; reconnects forever
    let connection = ConnectionManager::spawn(config.device.clone(), Arc::new(DeviceConnector));

    let state = Arc::new(AppState::new(config.clone(), connection));

    // Start server
    let addr = format!("{}:{}", config.api.host, config.api.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
