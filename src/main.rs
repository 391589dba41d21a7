use anyhow::Context;
use nsbridge::{
    apis::NightscoutClient,
    arguments,
    config::{self, Config},
    logger::{self, LogTag},
    treatments::TreatmentStore,
    webserver::{self, AppState},
};
use std::sync::Arc;

/// Mini-app API server
///
/// Serves the treatment editor and its API until Ctrl+C.
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
        logger::error(LogTag::System, &format!("❌ Server failed: {:#}", e));
        logger::flush();
        std::process::exit(1);
    }
    logger::flush();
}

async fn run(config: Config) -> anyhow::Result<()> {
    config::require_fields(&config, &["NS_URL", "TG_TOKEN", "MEDIA_ROOT", "MEDIA_BASE_URL"])?;
    if config.telegram.allowed_user_ids.is_empty() {
        logger::warning(
            LogTag::Security,
            "ALLOWED_USER_IDS is empty, every mini-app request will be rejected",
        );
    }

    let client = NightscoutClient::from_config(&config.nightscout)
        .context("Failed to create Nightscout client")?;
    let store: Arc<dyn TreatmentStore> = Arc::new(client);
    let state = AppState::new(Arc::new(config), store);

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::info(LogTag::System, "Ctrl+C received, shutting down");
            webserver::shutdown();
        }
    });

    logger::info(LogTag::System, "🚀 nsbridge starting up...");
    webserver::start_server(state)
        .await
        .context("Webserver stopped with an error")
}
