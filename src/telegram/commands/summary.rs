//! Summary commands
//!
//! Each handler returns the reply text; store failures propagate to the
//! router, which logs them.

use crate::errors::BridgeError;
use crate::summary::{build_day_summary, build_week_summary};
use crate::telegram::formatters::parse_date_arg;
use crate::treatments::TreatmentStore;
use chrono::{Duration, NaiveDate};

pub const HELP_TEXT: &str = "Доступные команды:\n\
/today — сумма за сегодня\n\
/yesterday — сумма за вчера\n\
/day YYYY-MM-DD — сумма за указанную дату\n\
/avgweek — итоги и среднее за текущую неделю";

const BAD_DATE_TEXT: &str = "Не удалось распознать дату. Форматы: YYYY-MM-DD или DD.MM.YYYY";
const DAY_USAGE_TEXT: &str = "Использование: /day YYYY-MM-DD";

/// Handle /start and /help
pub fn handle_help_command() -> String {
    HELP_TEXT.to_string()
}

/// Handle /today
pub async fn handle_today_command<S: TreatmentStore + ?Sized>(
    store: &S,
    args: &[String],
    today: NaiveDate,
    max_rows: usize,
) -> Result<String, BridgeError> {
    if !args.is_empty() {
        return Ok("Команда /today не принимает аргументы.".to_string());
    }
    build_day_summary(store, today, max_rows).await
}

/// Handle /yesterday
pub async fn handle_yesterday_command<S: TreatmentStore + ?Sized>(
    store: &S,
    args: &[String],
    today: NaiveDate,
    max_rows: usize,
) -> Result<String, BridgeError> {
    if !args.is_empty() {
        return Ok("Команда /yesterday не принимает аргументы.".to_string());
    }
    build_day_summary(store, today - Duration::days(1), max_rows).await
}

/// Handle /day and /date
pub async fn handle_day_command<S: TreatmentStore + ?Sized>(
    store: &S,
    args: &[String],
    max_rows: usize,
) -> Result<String, BridgeError> {
    let Some(raw) = args.first() else {
        return Ok(DAY_USAGE_TEXT.to_string());
    };
    match parse_date_arg(raw) {
        Some(date) => build_day_summary(store, date, max_rows).await,
        None => Ok(BAD_DATE_TEXT.to_string()),
    }
}

/// Handle /week, /avgweek and /weekavg; the optional argument picks the week
pub async fn handle_week_command<S: TreatmentStore + ?Sized>(
    store: &S,
    args: &[String],
    today: NaiveDate,
    max_rows: usize,
) -> Result<String, BridgeError> {
    let reference = match args.first() {
        Some(raw) => match parse_date_arg(raw) {
            Some(date) => date,
            None => return Ok(BAD_DATE_TEXT.to_string()),
        },
        None => today,
    };
    build_week_summary(store, reference, max_rows).await
}
