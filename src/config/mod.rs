//! Configuration system
//!
//! Sections are declared once in `schemas.rs` with `config_struct!`; loading,
//! environment overrides and validation live in `utils.rs`.

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    Config, LoggingConfig, MediaConfig, NightscoutConfig, TelegramConfig, WebserverConfig,
};
pub use utils::{load_config, load_config_file, require_fields, CONFIG_FILE_PATH};
