//! Telegram integration
//!
//! ```text
//! telegram/
//! ├── mod.rs          # This file - bot construction
//! ├── bot.rs          # Long-polling summary bot
//! ├── commands/       # Command parsing and handlers
//! ├── formatters.rs   # Amount and date formatting
//! ├── init_data.rs    # Mini-app signature verification
//! └── notifier.rs     # Messages with a WebApp button
//! ```

// ============================================================================
// SUBMODULES
// ============================================================================

pub mod bot;
pub mod commands;
pub mod formatters;
pub mod init_data;
pub mod notifier;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use bot::SummaryBot;
pub use init_data::{verify_init_data, VerifiedInitData};
pub use notifier::{webapp_url, WebAppNotifier};

use crate::apis::client::HttpClient;
use crate::config::TelegramConfig;
use crate::errors::BridgeError;
use teloxide::Bot;

/// Bot handle with the configured connect and total timeouts
///
/// `request_timeout_secs` must stay above `poll_timeout_secs`.
pub fn build_bot(config: &TelegramConfig) -> Result<Bot, BridgeError> {
    if config.bot_token.is_empty() {
        return Err(BridgeError::configuration("TG_TOKEN is not configured"));
    }
    let http = HttpClient::new(config.connect_timeout_secs, config.request_timeout_secs)?;
    Ok(Bot::with_client(config.bot_token.clone(), http.client().clone()))
}
