use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

use user_admin::app_system::{setup_tracing, AdminSystem};
use user_admin::config::{AppConfig, Cli};
use user_admin::console::{App, Console};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::try_from(Cli::parse())?;

    // Setup tracing once for the entire application
    setup_tracing(config.json_logs);

    info!("Starting user admin console");

    let system = AdminSystem::start(&config).await?;
    let app = App::new(&system).await;

    let console = Console::new(app, BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    if let Err(e) = console.run().await {
        error!(error = %e, "Console failed");
    }

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
