//! Long-polling summary bot
//!
//! Reads messages with `getUpdates`, answers summary commands and ignores
//! everything else. A failed poll is logged and retried after a pause; a
//! failed update is logged and skipped.

use super::commands::{dispatch, parse_command};
use crate::config::Config;
use crate::errors::BridgeError;
use crate::logger::{self, LogTag};
use crate::treatments::TreatmentStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{Update, UpdateKind};

/// Telegram summary bot
pub struct SummaryBot<S: TreatmentStore + ?Sized> {
    bot: Bot,
    store: Arc<S>,
    allowed_user_ids: Vec<i64>,
    poll_timeout_secs: u32,
    retry_delay: Duration,
    max_rows: usize,
    /// Next update id to request
    offset: Option<i32>,
}

impl<S: TreatmentStore + ?Sized> SummaryBot<S> {
    pub fn new(config: &Config, store: Arc<S>) -> Result<Self, BridgeError> {
        Ok(Self {
            bot: super::build_bot(&config.telegram)?,
            store,
            allowed_user_ids: config.telegram.allowed_user_ids.clone(),
            poll_timeout_secs: config.telegram.poll_timeout_secs,
            retry_delay: Duration::from_secs(config.telegram.retry_delay_secs),
            max_rows: config.nightscout.range_max_rows,
            offset: None,
        })
    }

    /// Poll forever; cancel by dropping the future
    pub async fn run(&mut self) {
        logger::info(LogTag::Telegram, "Starting Telegram summary bot");

        loop {
            let updates = match self.fetch_updates().await {
                Ok(updates) => updates,
                Err(e) => {
                    logger::error(LogTag::Telegram, &format!("Failed to fetch updates: {}", e));
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            for update in updates {
                self.offset = Some(update.id + 1);
                let update_id = update.id;
                if let Err(e) = self.handle_update(update).await {
                    logger::error(
                        LogTag::Telegram,
                        &format!("Error handling update {}: {}", update_id, e),
                    );
                }
            }
        }
    }

    async fn fetch_updates(&self) -> Result<Vec<Update>, BridgeError> {
        let mut request = self.bot.get_updates().timeout(self.poll_timeout_secs);
        if let Some(offset) = self.offset {
            request = request.offset(offset);
        }
        Ok(request.await?)
    }

    async fn handle_update(&self, update: Update) -> Result<(), BridgeError> {
        let message = match update.kind {
            UpdateKind::Message(message) | UpdateKind::EditedMessage(message) => message,
            _ => return Ok(()),
        };
        let Some(text) = message.text() else {
            return Ok(());
        };

        let user_id = message.from().map(|user| user.id.0 as i64);
        if !is_user_allowed(&self.allowed_user_ids, user_id) {
            logger::info(
                LogTag::Security,
                &format!("Ignoring message from unauthorized user {:?}", user_id),
            );
            return Ok(());
        }

        let Some(parsed) = parse_command(text) else {
            return Ok(());
        };
        logger::debug(
            LogTag::Telegram,
            &format!("Command {:?} with {} args", parsed.command, parsed.args.len()),
        );

        let today = Utc::now().date_naive();
        let reply = dispatch(self.store.as_ref(), &parsed, today, self.max_rows).await?;

        self.bot
            .send_message(message.chat.id, reply)
            .disable_web_page_preview(true)
            .await?;
        Ok(())
    }
}

/// An empty allow-list admits everyone
pub fn is_user_allowed(allowed_user_ids: &[i64], user_id: Option<i64>) -> bool {
    if allowed_user_ids.is_empty() {
        return true;
    }
    user_id.map_or(false, |id| allowed_user_ids.contains(&id))
}
