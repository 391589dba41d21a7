//! Structured logging for the Nightscout bridge
//!
//! Every message carries a [`LogTag`] naming the subsystem it came from and a
//! [`LogLevel`]. Output goes to a colored console line and, when a log file is
//! configured, to a plain-text file.
//!
//! ## Usage
//!
//! ```rust
//! use nsbridge::logger::{self, LogTag};
//!
//! logger::error(LogTag::Store, "Nightscout unreachable");
//! logger::warning(LogTag::Summary, "Range fetch truncated");
//! logger::info(LogTag::Reconcile, "Treatment updated in place");
//! logger::debug(LogTag::Store, "GET /api/v1/treatments.json"); // Only with --debug-store
//! logger::verbose(LogTag::Telegram, "Raw update payload"); // Only with --verbose
//! ```
//!
//! ## Initialization
//!
//! Call once at startup, before the first log line:
//! ```rust,ignore
//! logger::init(config.logging.file.as_deref());
//! ```
//!
//! This scans command-line arguments for `--debug-<tag>`, `--verbose` and
//! `--quiet` and opens the log file if one was given.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Reads debug flags from the process arguments and opens `log_file` for
/// appending when provided. Safe to call more than once; the last call wins.
pub fn init(log_file: Option<&str>) {
    config::init_from_args();

    if let Some(path) = log_file {
        if let Err(e) = file::init_file_logging(path) {
            eprintln!("Failed to open log file '{}': {}", path, e);
        }
    }
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when `--debug-<tag>` was passed for this tag, e.g.
/// `--debug-store` or `--debug-reconcile`.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush pending file writes
pub fn flush() {
    file::flush_file_logging();
}
