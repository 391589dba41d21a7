//! Bot command router

pub mod summary;

use crate::errors::BridgeError;
use crate::treatments::TreatmentStore;
use chrono::NaiveDate;

pub const UNKNOWN_COMMAND_TEXT: &str =
    "Неизвестная команда. Используйте /help для списка команд.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Today,
    Yesterday,
    Day,
    Week,
    Unknown,
}

impl Command {
    fn from_name(name: &str) -> Self {
        match name {
            "/start" | "/help" => Command::Help,
            "/today" => Command::Today,
            "/yesterday" => Command::Yesterday,
            "/day" | "/date" => Command::Day,
            "/week" | "/avgweek" | "/weekavg" => Command::Week,
            _ => Command::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: Command,
    pub args: Vec<String>,
}

/// Split message text into a command and its arguments
///
/// The command word is lower-cased and a `@botname` suffix is dropped.
/// Returns `None` for blank text.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let mut words = text.split_whitespace();
    let first = words.next()?.to_lowercase();
    let name = first.split('@').next().unwrap_or_default();

    Some(ParsedCommand {
        command: Command::from_name(name),
        args: words.map(str::to_string).collect(),
    })
}

/// Produce the reply for one message
pub async fn dispatch<S: TreatmentStore + ?Sized>(
    store: &S,
    parsed: &ParsedCommand,
    today: NaiveDate,
    max_rows: usize,
) -> Result<String, BridgeError> {
    let args = parsed.args.as_slice();
    match parsed.command {
        Command::Help => Ok(summary::handle_help_command()),
        Command::Today => summary::handle_today_command(store, args, today, max_rows).await,
        Command::Yesterday => {
            summary::handle_yesterday_command(store, args, today, max_rows).await
        }
        Command::Day => summary::handle_day_command(store, args, max_rows).await,
        Command::Week => summary::handle_week_command(store, args, today, max_rows).await,
        Command::Unknown => Ok(UNKNOWN_COMMAND_TEXT.to_string()),
    }
}
