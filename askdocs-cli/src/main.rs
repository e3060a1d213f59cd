use anyhow::Context;
use askdocs_cli::{Cli, commands};
use askdocs_telemetry::init_telemetry;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_telemetry(&cli.settings.telemetry_config()).context("failed to initialise logging")?;

    commands::run(cli).await
}
