use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ride_tracker_data_management::RideManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "RideCLI")]
#[command(about = "A CLI to inspect vehicles and replay recorded rides", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the vehicles rides can be started with
    Vehicles,
    /// Estimate how far the fuel bought for the given amount goes
    Estimate {
        vehicle: String,
        fuel_cost: f64,
        /// Requested distance in km
        #[arg(long)]
        distance: Option<f64>,
    },
    /// Replay a file of `lat,lon,speed` lines as a ride and print its summary
    Replay {
        vehicle: String,
        fuel_filled: f64,
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ride_tracker_data_management=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let manager = RideManager::default();

    match &cli.command {
        Commands::Vehicles => {
            for vehicle in manager.catalog().vehicles() {
                println!("{}\t{}\t{} L\t{} km/L", vehicle.id, vehicle.name, vehicle.tank_capacity, vehicle.mileage);
            }
        },
        Commands::Estimate { vehicle, fuel_cost, distance } => {
            let estimate = manager.estimate(vehicle, *fuel_cost, *distance)?;
            println!("{}", serde_json::to_string_pretty(&estimate)?);
        },
        Commands::Replay { vehicle, fuel_filled, file } => {
            let summary = manager.replay_track_file(vehicle, *fuel_filled, file).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        },
    }

    Ok(())
}
