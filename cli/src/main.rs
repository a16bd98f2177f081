mod commands;
mod config;
mod menu;
mod telemetry;

use clap::Parser;
use commands::App;
use config::{CliArgs, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = Config::try_from(&args)?;

    telemetry::init_logging()?;
    tracing::debug!(
        backend = ?config.backend,
        timeout = ?config.timeout,
        users_url = %config.users_url,
        "starting"
    );

    let app = App::new(&config)?;
    app.run(args.command).await
}
