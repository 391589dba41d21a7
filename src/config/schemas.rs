/// Configuration schemas - all config structures defined once with defaults
///
/// Each section is declared with `config_struct!`, so a TOML file only needs
/// the keys it wants to override.
use crate::config_struct;

// ============================================================================
// NIGHTSCOUT CONFIGURATION
// ============================================================================

config_struct! {
    /// Nightscout treatment store connection
    pub struct NightscoutConfig {
        /// Base URL of the Nightscout site, without trailing slash
        url: String = String::new(),
        /// Access token appended as `token` query parameter
        token: Option<String> = None,
        /// Shared API secret, sent SHA-1 hashed in the `api-secret` header
        api_secret: Option<String> = None,
        connect_timeout_secs: u64 = 5,
        request_timeout_secs: u64 = 10,
        /// Hard cap on rows fetched by one range query
        range_max_rows: usize = 5000,
    }
}

// ============================================================================
// TELEGRAM CONFIGURATION
// ============================================================================

config_struct! {
    /// Telegram bot and mini-app settings
    pub struct TelegramConfig {
        /// Bot token from @BotFather; also keys the mini-app signature
        bot_token: String = String::new(),
        /// Chat receiving messages from the CLI sender
        chat_id: Option<i64> = None,
        /// Users allowed to use the mini-app and the bot
        allowed_user_ids: Vec<i64> = Vec::new(),
        poll_timeout_secs: u32 = 25,
        connect_timeout_secs: u64 = 10,
        request_timeout_secs: u64 = 35,
        /// Pause after a failed getUpdates call
        retry_delay_secs: u64 = 5,
    }
}

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP server settings
    pub struct WebserverConfig {
        host: String = "0.0.0.0".to_string(),
        port: u16 = 8000,
        /// Public base URL of this server (used for mini-app links)
        app_base_url: String = String::new(),
        /// Directory served under /webapp
        webapp_dir: String = "webapp".to_string(),
    }
}

// ============================================================================
// MEDIA CONFIGURATION
// ============================================================================

config_struct! {
    /// Uploaded image storage
    pub struct MediaConfig {
        root: String = String::new(),
        /// Public URL prefix mapped onto `root`
        base_url: String = String::new(),
        max_upload_bytes: usize = 5 * 1024 * 1024,
    }
}

config_struct! {
    /// Log output settings
    pub struct LoggingConfig {
        /// Optional file receiving a plain-text copy of every log line
        file: Option<String> = None,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Complete process configuration, built once at startup
    pub struct Config {
        nightscout: NightscoutConfig = NightscoutConfig::default(),
        telegram: TelegramConfig = TelegramConfig::default(),
        webserver: WebserverConfig = WebserverConfig::default(),
        media: MediaConfig = MediaConfig::default(),
        logging: LoggingConfig = LoggingConfig::default(),
    }
}
