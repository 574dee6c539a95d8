use std::{fs::OpenOptions, sync::{Arc, Mutex}};

use ride_tracker_data_management::RideManager;
use ride_tracker_server::{config::ServerConfig, ride_endpoint, server_state::ServerState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    std::fs::create_dir_all(&config.log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_dir.join("server.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,ride_tracker_data_management=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();

    tracing::info!("Starting server...");

    let server_state = Arc::new(ServerState {
        ride_manager: RideManager::default(),
    });

    let app = ride_endpoint::router(server_state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
