use anyhow::Context;
use nsbridge::{
    apis::NightscoutClient,
    arguments,
    config::{self, Config},
    logger::{self, LogTag},
    telegram::SummaryBot,
};
use std::sync::Arc;

/// Telegram bot answering nutrition summary commands
///
/// Runs until Ctrl+C.
#[tokio::main]
async fn main() {
    let config = match config::load_config(arguments::config_path().as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    logger::init(config.logging.file.as_deref());

    if let Err(e) = run(config).await {
        logger::error(LogTag::System, &format!("❌ Summary bot failed: {:#}", e));
        logger::flush();
        std::process::exit(1);
    }
    logger::flush();
}

async fn run(config: Config) -> anyhow::Result<()> {
    config::require_fields(&config, &["TG_TOKEN", "NS_URL"])?;

    let client = NightscoutClient::from_config(&config.nightscout)
        .context("Failed to create Nightscout client")?;
    let mut bot =
        SummaryBot::new(&config, Arc::new(client)).context("Failed to create Telegram bot")?;

    tokio::select! {
        _ = bot.run() => {}
        _ = tokio::signal::ctrl_c() => {
            logger::info(LogTag::System, "Ctrl+C received, stopping summary bot");
        }
    }
    Ok(())
}
