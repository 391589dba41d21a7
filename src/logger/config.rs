/// Logger configuration derived from command-line flags
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

/// Runtime logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level shown without a per-tag flag
    pub min_level: LogLevel,
    /// Tags with debug output enabled (lower-case keys)
    pub debug_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Snapshot of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    match LOGGER_CONFIG.read() {
        Ok(cfg) => cfg.clone(),
        Err(_) => LoggerConfig::default(),
    }
}

/// Replace the logger configuration
pub fn set_logger_config(config: LoggerConfig) {
    if let Ok(mut cfg) = LOGGER_CONFIG.write() {
        *cfg = config;
    }
}

/// Build the configuration from `--quiet`, `--verbose` and `--debug-<tag>`
pub fn init_from_args() {
    let args = arguments::get_cmd_args();

    let min_level = if arguments::has_arg("--verbose") {
        LogLevel::Verbose
    } else if arguments::has_arg("--quiet") {
        LogLevel::Error
    } else {
        LogLevel::Info
    };

    let debug_tags = args
        .iter()
        .filter_map(|arg| arg.strip_prefix("--debug-"))
        .map(|tag| tag.to_lowercase())
        .collect();

    set_logger_config(LoggerConfig {
        min_level,
        debug_tags,
    });
}

/// Check whether `--debug-<tag>` was given for this tag
pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    get_logger_config().debug_tags.contains(&tag.to_debug_key())
}
