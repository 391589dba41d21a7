//! Messages with a mini-app button
//!
//! Used by the `send_telegram` CLI: the summary text goes to the configured
//! chat with an inline WebApp button that opens the editor for one treatment.

use crate::config::Config;
use crate::errors::BridgeError;
use crate::logger::{self, LogTag};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use url::Url;

pub const EDIT_BUTTON_TEXT: &str = "✏️ Редактировать";

/// Telegram notifier bound to one chat
pub struct WebAppNotifier {
    bot: Bot,
    chat_id: ChatId,
    app_base_url: String,
}

impl WebAppNotifier {
    pub fn from_config(config: &Config) -> Result<Self, BridgeError> {
        let chat_id = config
            .telegram
            .chat_id
            .ok_or_else(|| BridgeError::configuration("TG_CHAT_ID is not configured"))?;

        Ok(Self {
            bot: super::build_bot(&config.telegram)?,
            chat_id: ChatId(chat_id),
            app_base_url: config.webserver.app_base_url.clone(),
        })
    }

    /// Send `text` with an edit button for treatment `cid`
    pub async fn send_with_webapp(&self, text: &str, cid: &str) -> Result<(), BridgeError> {
        let url = webapp_url(&self.app_base_url, cid)?;
        let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::web_app(
            EDIT_BUTTON_TEXT,
            WebAppInfo { url },
        )]]);

        self.bot
            .send_message(self.chat_id, text)
            .reply_markup(keyboard)
            .disable_web_page_preview(true)
            .await?;

        logger::info(
            LogTag::Telegram,
            &format!("Telegram message sent (cid={})", cid),
        );
        Ok(())
    }
}

/// `<app_base_url>/webapp/?cid=<cid>`
pub fn webapp_url(app_base_url: &str, cid: &str) -> Result<Url, BridgeError> {
    let base = app_base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{}/webapp/", base))
        .map_err(|e| BridgeError::configuration(format!("Invalid APP_BASE_URL: {}", e)))?;
    url.query_pairs_mut().append_pair("cid", cid);
    Ok(url)
}
