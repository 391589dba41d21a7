/// Base HTTP client with connect and total timeouts
use crate::errors::BridgeError;
use reqwest::Client;
use std::time::Duration;

/// HTTP client wrapper shared by the Nightscout and Telegram clients
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(connect_timeout_secs: u64, timeout_secs: u64) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                BridgeError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
