//! Main entry point for Comet Bot.

use anyhow::Context;
use comet_bot::CometBot;
use comet_common::init_logging;
use comet_config::ConfigLoader;
use std::time::Duration;
use tracing::info;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    let result = runtime.block_on(run());
    // a pending stdin read only returns on the next line
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    init_logging(config.logging.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Comet Bot");

    let bot = CometBot::new(config)?;
    bot.start().await;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = bot.run_console(stdin, tokio::io::stdout()) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received");
            bot.stop();
        }
    }

    info!("Comet Bot stopped");
    Ok(())
}
