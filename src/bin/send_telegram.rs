use anyhow::Context;
use clap::Parser;
use nsbridge::{
    arguments,
    config::{self, Config},
    logger::{self, LogTag},
    telegram::WebAppNotifier,
};

#[derive(Parser)]
#[command(name = "send_telegram")]
#[command(about = "Send a Telegram message with a mini-app edit button", long_about = None)]
struct Args {
    /// Client identifier of the Nightscout treatment
    cid: String,

    /// Message text to send
    summary: String,

    /// Configuration file (defaults to data/config.toml when present)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse_from(arguments::without_logger_flags());

    let config = match config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    logger::init(config.logging.file.as_deref());

    let result = send(&config, &args).await;
    if let Err(e) = result {
        logger::error(LogTag::Telegram, &format!("❌ Failed to send message: {:#}", e));
        logger::flush();
        std::process::exit(1);
    }
    logger::flush();
}

async fn send(config: &Config, args: &Args) -> anyhow::Result<()> {
    config::require_fields(config, &["TG_TOKEN", "TG_CHAT_ID"])?;
    let notifier = WebAppNotifier::from_config(config).context("Failed to create notifier")?;
    notifier
        .send_with_webapp(&args.summary, &args.cid)
        .await
        .with_context(|| format!("sendMessage failed for cid {}", args.cid))
}
