/// Configuration utilities - loading, environment overrides and validation
///
/// The configuration is built once at startup by [`load_config`] and then
/// passed by reference to every component. Loading order:
/// 1. Defaults from the schema definitions
/// 2. TOML file (explicit path, or `data/config.toml` when present)
/// 3. `.env` file and process environment (`NS_URL`, `TG_TOKEN`, ...)
use super::schemas::Config;
use crate::errors::BridgeError;
use crate::logger::{self, LogTag};
use std::collections::HashMap;

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from disk and the environment
///
/// A missing file at the default path is fine (defaults are used); a missing
/// file at an explicit path is an error.
pub fn load_config(path: Option<&str>) -> Result<Config, BridgeError> {
    let mut config = match path {
        Some(explicit) => load_config_file(explicit)?,
        None if std::path::Path::new(CONFIG_FILE_PATH).exists() => {
            load_config_file(CONFIG_FILE_PATH)?
        }
        None => Config::default(),
    };

    // A missing .env is the common case in production
    let _ = dotenv::dotenv();
    let env: HashMap<String, String> = std::env::vars().collect();
    apply_env_overrides(&mut config, &env)?;
    normalize(&mut config);

    logger::debug(
        LogTag::Config,
        &format!(
            "Configuration loaded (nightscout={}, allowed users={})",
            config.nightscout.url,
            config.telegram.allowed_user_ids.len()
        ),
    );

    Ok(config)
}

/// Parse a TOML configuration file
pub fn load_config_file(path: &str) -> Result<Config, BridgeError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        BridgeError::configuration(format!("Failed to read config file '{}': {}", path, e))
    })?;

    toml::from_str::<Config>(&contents).map_err(|e| {
        BridgeError::configuration(format!("Failed to parse config file '{}': {}", path, e))
    })
}

/// Apply environment variable overrides on top of file values
///
/// Empty variables are ignored so a blank line in `.env` does not wipe a
/// value coming from the TOML file.
pub fn apply_env_overrides(
    config: &mut Config,
    env: &HashMap<String, String>,
) -> Result<(), BridgeError> {
    let get = |key: &str| -> Option<String> {
        env.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(url) = get("NS_URL") {
        config.nightscout.url = url;
    }
    if let Some(token) = get("NS_TOKEN") {
        config.nightscout.token = Some(token);
    }
    if let Some(secret) = get("NS_API_SECRET") {
        config.nightscout.api_secret = Some(secret);
    }
    if let Some(token) = get("TG_TOKEN") {
        config.telegram.bot_token = token;
    }
    if let Some(ids) = get("ALLOWED_USER_IDS") {
        config.telegram.allowed_user_ids = parse_user_ids(&ids)?;
    }
    if let Some(chat_id) = get("TG_CHAT_ID") {
        let parsed = chat_id
            .parse::<i64>()
            .map_err(|_| BridgeError::configuration(format!("Invalid TG_CHAT_ID: {}", chat_id)))?;
        config.telegram.chat_id = Some(parsed);
    }
    if let Some(root) = get("MEDIA_ROOT") {
        config.media.root = root;
    }
    if let Some(base_url) = get("MEDIA_BASE_URL") {
        config.media.base_url = base_url;
    }
    if let Some(app_base_url) = get("APP_BASE_URL") {
        config.webserver.app_base_url = app_base_url;
    }
    if let Some(host) = get("HOST") {
        config.webserver.host = host;
    }
    if let Some(port) = get("PORT") {
        config.webserver.port = port
            .parse::<u16>()
            .map_err(|_| BridgeError::configuration(format!("Invalid PORT: {}", port)))?;
    }

    Ok(())
}

/// Parse a comma-separated list of Telegram user ids
pub fn parse_user_ids(raw: &str) -> Result<Vec<i64>, BridgeError> {
    raw.split(',')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            chunk
                .parse::<i64>()
                .map_err(|_| BridgeError::configuration(format!("Invalid user id: {}", chunk)))
        })
        .collect()
}

/// Strip trailing slashes from every base URL
pub fn normalize(config: &mut Config) {
    for url in [
        &mut config.nightscout.url,
        &mut config.media.base_url,
        &mut config.webserver.app_base_url,
    ] {
        let trimmed = url.trim_end_matches('/').to_string();
        *url = trimmed;
    }
}

/// Fail with a configuration error naming every empty required field
pub fn require_fields(config: &Config, fields: &[&str]) -> Result<(), BridgeError> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| match *field {
            "NS_URL" => config.nightscout.url.is_empty(),
            "TG_TOKEN" => config.telegram.bot_token.is_empty(),
            "TG_CHAT_ID" => config.telegram.chat_id.is_none(),
            "MEDIA_ROOT" => config.media.root.is_empty(),
            "MEDIA_BASE_URL" => config.media.base_url.is_empty(),
            "APP_BASE_URL" => config.webserver.app_base_url.is_empty(),
            _ => false,
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BridgeError::configuration(format!(
            "{} is not configured",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.webserver.port, 8000);
        assert_eq!(config.nightscout.connect_timeout_secs, 5);
        assert_eq!(config.nightscout.request_timeout_secs, 10);
        assert_eq!(config.telegram.poll_timeout_secs, 25);
        assert_eq!(config.media.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [nightscout]
            url = "https://ns.example.com/"

            [telegram]
            allowed_user_ids = [42]
            "#,
        )
        .unwrap();
        assert_eq!(config.nightscout.url, "https://ns.example.com/");
        assert_eq!(config.nightscout.range_max_rows, 5000);
        assert_eq!(config.telegram.allowed_user_ids, vec![42]);
        assert_eq!(config.webserver.host, "0.0.0.0");
    }

    #[test]
    fn test_env_overrides_and_normalize() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            &env(&[
                ("NS_URL", "https://ns.example.com///"),
                ("NS_API_SECRET", "secret"),
                ("ALLOWED_USER_IDS", " 1, 2 ,,3 "),
                ("TG_CHAT_ID", "-100500"),
                ("PORT", "9001"),
                ("NS_TOKEN", "   "),
            ]),
        )
        .unwrap();
        normalize(&mut config);

        assert_eq!(config.nightscout.url, "https://ns.example.com");
        assert_eq!(config.nightscout.api_secret.as_deref(), Some("secret"));
        assert_eq!(config.nightscout.token, None);
        assert_eq!(config.telegram.allowed_user_ids, vec![1, 2, 3]);
        assert_eq!(config.telegram.chat_id, Some(-100500));
        assert_eq!(config.webserver.port, 9001);
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = Config::default();
        let err = apply_env_overrides(&mut config, &env(&[("ALLOWED_USER_IDS", "1,abc")]))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid user id: abc"));

        let err = apply_env_overrides(&mut config, &env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[test]
    fn test_require_fields() {
        let mut config = Config::default();
        let err = require_fields(&config, &["NS_URL", "TG_TOKEN"]).unwrap_err();
        assert!(err.to_string().contains("NS_URL, TG_TOKEN"));

        config.nightscout.url = "https://ns.example.com".to_string();
        config.telegram.bot_token = "123:abc".to_string();
        assert!(require_fields(&config, &["NS_URL", "TG_TOKEN"]).is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[nightscout]"));
        assert!(toml_str.contains("[webserver]"));
    }
}
