/// Shared application state for the webserver
use crate::config::Config;
use crate::errors::{BridgeError, SignatureError};
use crate::telegram::{verify_init_data, VerifiedInitData};
use crate::treatments::{TreatmentService, TreatmentStore};
use std::sync::Arc;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Treatment operations over the configured store
    pub service: TreatmentService<dyn TreatmentStore>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn TreatmentStore>) -> Self {
        Self {
            config,
            service: TreatmentService::new(store),
            startup_time: chrono::Utc::now(),
        }
    }

    /// Check mini-app init data against the bot token and allow-list
    pub fn verify(&self, init_data: Option<&str>) -> Result<VerifiedInitData, BridgeError> {
        let init_data = init_data.ok_or(SignatureError::MissingInitData)?;
        Ok(verify_init_data(
            init_data,
            &self.config.telegram.bot_token,
            &self.config.telegram.allowed_user_ids,
        )?)
    }
}
