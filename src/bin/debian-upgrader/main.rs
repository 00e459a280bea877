//! debian-upgrader CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use debian_upgrader::upgrade::RebootOutcome;
use debian_upgrader::Upgrader;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();
    let json_logs = cli.json_logs;
    let write_config = cli.write_config.clone();

    // Build configuration
    let config = cli.into_config()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("debian-upgrader v{}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = write_config {
        config.to_file(&path)?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let report = Upgrader::system(config)?.run().await?;

    info!(
        "Upgrade finished: {} (sources rewritten: {}, keyring: {:?}, legacy fragment removed: {})",
        report.plan.installed(),
        report.sources_rewritten,
        report.key,
        report.legacy_fragment_removed
    );
    if report.reboot == RebootOutcome::Rebooting {
        info!("Reboot requested");
    }
    Ok(())
}
