//! Daily and weekly nutrition summaries sent by the bot

use crate::errors::BridgeError;
use crate::logger::{self, LogTag};
use crate::telegram::formatters::format_amount;
use crate::treatments::aggregate::{aggregate, fetch_range, local_date};
use crate::treatments::TreatmentStore;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

const DAY_PAGE_SIZE: usize = 200;
const DAY_FALLBACK_PAGE_SIZE: usize = 500;
const WEEK_PAGE_SIZE: usize = 1000;

const DAY_LABELS: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

const UNIT_INSULIN: &str = "ед";
const UNIT_CARBS: &str = "г";
const UNIT_CALORIES: &str = "ккал";

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Monday of the week containing `date`
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn insulin(value: f64) -> String {
    format_amount(value, UNIT_INSULIN, 1)
}

fn carbs(value: f64) -> String {
    format_amount(value, UNIT_CARBS, 0)
}

fn calories(value: f64) -> String {
    format_amount(value, UNIT_CALORIES, 0)
}

/// Summary of one local day
///
/// Looks at the UTC day first. When that is empty the whole containing week
/// is scanned and filtered by local day, which catches records whose
/// `utcOffset` moves them across midnight.
pub async fn build_day_summary<S: TreatmentStore + ?Sized>(
    store: &S,
    target: NaiveDate,
    max_rows: usize,
) -> Result<String, BridgeError> {
    let start = day_start(target);
    let end = start + Duration::days(1);
    let mut records = fetch_range(store, start, end, DAY_PAGE_SIZE, max_rows)
        .await?
        .records;

    if records.is_empty() {
        let fallback_start = day_start(week_start(target));
        let fallback_end = fallback_start + Duration::days(7);
        logger::debug(
            LogTag::Summary,
            &format!("No records on UTC day {}, scanning the week", target),
        );
        records = fetch_range(store, fallback_start, fallback_end, DAY_FALLBACK_PAGE_SIZE, max_rows)
            .await?
            .records
            .into_iter()
            .filter(|r| local_date(r) == Some(target))
            .collect();
    }

    let totals = aggregate(&records);
    let header = format!("📅 {}", target.format("%d.%m.%Y"));

    let Some(day) = totals.daily.get(&target).filter(|d| d.entries > 0) else {
        return Ok(format!("{}\nНет записей.", header));
    };

    Ok([
        header,
        format!("Записей: {}", day.entries),
        format!("Инсулин: {}", insulin(day.insulin)),
        format!("Углеводы: {}", carbs(day.carbs)),
        format!("Калории: {}", calories(day.calories)),
    ]
    .join("\n"))
}

/// Summary of the Monday-based week containing `reference`
pub async fn build_week_summary<S: TreatmentStore + ?Sized>(
    store: &S,
    reference: NaiveDate,
    max_rows: usize,
) -> Result<String, BridgeError> {
    let first_day = week_start(reference);
    let start = day_start(first_day);
    let end = start + Duration::days(7);

    let fetch = fetch_range(store, start, end, WEEK_PAGE_SIZE, max_rows).await?;
    let totals = aggregate(&fetch.records);

    let last_day = first_day + Duration::days(6);
    let header = format!(
        "📈 Неделя {} – {}",
        first_day.format("%d.%m"),
        last_day.format("%d.%m.%Y")
    );

    if totals.entries == 0 {
        return Ok(format!("{}\nНет записей на этой неделе.", header));
    }

    let days_with_entries = totals.daily.values().filter(|d| d.entries > 0).count();
    let divider = days_with_entries.max(1) as f64;

    let mut lines = vec![header];
    for (offset, label) in DAY_LABELS.iter().enumerate() {
        let date = first_day + Duration::days(offset as i64);
        let date_label = date.format("%d.%m");
        match totals.daily.get(&date).filter(|d| d.entries > 0) {
            Some(day) => lines.push(format!(
                "• {} {}: {} запис., инсулин {}, углеводы {}, калории {}",
                label,
                date_label,
                day.entries,
                insulin(day.insulin),
                carbs(day.carbs),
                calories(day.calories)
            )),
            None => lines.push(format!("• {} {} — нет записей", label, date_label)),
        }
    }

    lines.extend([
        String::new(),
        format!("Дней с записями: {} из {}", days_with_entries, DAY_LABELS.len()),
        format!("Записей: {}", totals.entries),
        "Итого:".to_string(),
        format!("• Инсулин: {}", insulin(totals.insulin)),
        format!("• Углеводы: {}", carbs(totals.carbs)),
        format!("• Калории: {}", calories(totals.calories)),
        "Среднее за активный день:".to_string(),
        format!("• Инсулин: {}", insulin(totals.insulin / divider)),
        format!("• Углеводы: {}", carbs(totals.carbs / divider)),
        format!("• Калории: {}", calories(totals.calories / divider)),
    ]);

    Ok(lines.join("\n"))
}
