/// Centralized command-line flag access
///
/// The binaries parse their positional arguments with clap; the process-wide
/// flags (`--debug-<tag>`, `--verbose`, `--quiet`, `--config <path>`) are read
/// from here so the logger can pick them up before anything else runs.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Override the stored arguments (used by tests)
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Value following `flag`, accepting both `--flag value` and `--flag=value`
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    let inline_prefix = format!("{}=", flag);
    for (i, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&inline_prefix) {
            return Some(value.to_string());
        }
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

/// Explicit configuration file path (`--config <path>`)
pub fn config_path() -> Option<String> {
    get_arg_value("--config")
}

/// Arguments with the logger flags removed, for handing to clap
pub fn without_logger_flags() -> Vec<String> {
    get_cmd_args()
        .into_iter()
        .filter(|arg| !is_logger_flag(arg))
        .collect()
}

fn is_logger_flag(arg: &str) -> bool {
    arg == "--verbose" || arg == "--quiet" || arg.starts_with("--debug-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_lookup() {
        let previous = get_cmd_args();
        set_cmd_args(vec![
            "nsbridge".to_string(),
            "--debug-store".to_string(),
            "--config".to_string(),
            "custom.toml".to_string(),
            "--port=9000".to_string(),
        ]);

        assert!(has_arg("--debug-store"));
        assert!(!has_arg("--verbose"));
        assert_eq!(config_path().as_deref(), Some("custom.toml"));
        assert_eq!(get_arg_value("--port").as_deref(), Some("9000"));
        assert_eq!(get_arg_value("--missing"), None);
        assert_eq!(
            without_logger_flags(),
            vec!["nsbridge", "--config", "custom.toml", "--port=9000"]
        );

        set_cmd_args(previous);
    }
}
