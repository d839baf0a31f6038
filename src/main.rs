mod error;
mod adapters;
mod ledger;
mod monitor;
mod bootstrap;
mod config;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing::{error, info};

use crate::{config::Config, error::AppResult};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,monitor=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    // Load configuration
    dotenv::dotenv().ok();

    // Initialize tracing
    init_tracing();

    info!("🚀 Starting Wallet Token Monitor");

    if let Err(e) = run().await {
        error!("❌ Monitor terminated: {}", e);
        std::process::exit(1);
    }
}

/// Returns only on startup failure; a healthy monitor polls forever.
async fn run() -> AppResult<()> {
    let config = Config::from_env()?;
    let monitor = bootstrap::initialize_monitor(&config)?;
    monitor.run().await
}
