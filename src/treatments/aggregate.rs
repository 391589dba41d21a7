//! Range fetching and daily nutrition totals

use super::meta;
use super::record::{Treatment, FIELD_CALORIES, FIELD_CARBS, FIELD_INSULIN};
use super::store::{RangePage, TreatmentStore};
use crate::errors::BridgeError;
use crate::logger::{self, LogTag};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Records of one range scan
#[derive(Debug, Clone, Default)]
pub struct RangeFetch {
    pub records: Vec<Treatment>,
    /// The row cap was hit, or paging could not advance; older rows in the
    /// range may be missing
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayTotals {
    pub entries: usize,
    pub insulin: f64,
    pub carbs: f64,
    pub calories: f64,
}

impl DayTotals {
    fn add(&mut self, insulin: Option<f64>, carbs: Option<f64>, calories: Option<f64>) {
        self.insulin += insulin.unwrap_or(0.0);
        self.carbs += carbs.unwrap_or(0.0);
        self.calories += calories.unwrap_or(0.0);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    /// Every record, including ones without a usable timestamp
    pub entries: usize,
    pub insulin: f64,
    pub carbs: f64,
    pub calories: f64,
    pub daily: BTreeMap<NaiveDate, DayTotals>,
}

/// Fetch every record created in `[start, end)`, newest first
///
/// The first page is bounded by `end`; each following page is bounded by
/// the oldest `created_at` seen so far, inclusively, so records sharing that
/// timestamp across a page boundary are not skipped. Rows already collected
/// are dropped by `_id`. At most `max_rows` records are returned.
pub async fn fetch_range<S: TreatmentStore + ?Sized>(
    store: &S,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    page_size: usize,
    max_rows: usize,
) -> Result<RangeFetch, BridgeError> {
    let mut fetch = RangeFetch::default();
    let mut seen = HashSet::new();
    let mut cursor = end;
    let mut end_inclusive = false;
    let page_size = page_size.max(1);

    loop {
        let remaining = max_rows.saturating_sub(fetch.records.len());
        if remaining == 0 {
            fetch.truncated = true;
            logger::warning(
                LogTag::Summary,
                &format!(
                    "Range {} – {} truncated at {} records",
                    start.format("%Y-%m-%d %H:%M"),
                    end.format("%Y-%m-%d %H:%M"),
                    max_rows
                ),
            );
            break;
        }

        // Rows already collected at the cursor come back at the head of an inclusive page
        let at_cursor = if end_inclusive {
            fetch
                .records
                .iter()
                .filter(|r| r.created_at() == Some(cursor))
                .count()
        } else {
            0
        };
        let page = RangePage {
            start,
            end: cursor,
            end_inclusive,
            count: page_size.min(remaining) + at_cursor,
        };
        let rows = store.fetch_page(&page).await?;
        let row_count = rows.len();
        let oldest = rows.iter().filter_map(Treatment::created_at).min();

        let mut added = 0;
        let mut over_cap = false;
        for row in rows {
            let key = dedup_key(&row);
            if seen.contains(&key) {
                continue;
            }
            if added == remaining {
                over_cap = true;
                break;
            }
            seen.insert(key);
            fetch.records.push(row);
            added += 1;
        }

        logger::debug(
            LogTag::Store,
            &format!(
                "Range page up to {} returned {} rows, {} new",
                cursor.to_rfc3339(),
                row_count,
                added
            ),
        );

        if over_cap {
            // The next pass reports the truncation
            continue;
        }
        if row_count < page.count {
            break;
        }
        if added == 0 {
            fetch.truncated = true;
            logger::warning(
                LogTag::Summary,
                &format!(
                    "Range page at {} held no new records, stopping",
                    cursor.to_rfc3339()
                ),
            );
            break;
        }

        match oldest {
            Some(oldest) if oldest <= cursor => {
                cursor = oldest;
                end_inclusive = true;
            }
            _ => {
                logger::warning(
                    LogTag::Summary,
                    &format!("Range cursor stuck at {}, stopping", cursor.to_rfc3339()),
                );
                break;
            }
        }
    }

    Ok(fetch)
}

/// `_id`, or the whole document for records without one
fn dedup_key(record: &Treatment) -> String {
    match record.id() {
        Some(id) => id.to_string(),
        None => Value::Object(record.0.clone()).to_string(),
    }
}

/// Local calendar day of a record: UTC creation time shifted by `utcOffset`
pub fn local_date(record: &Treatment) -> Option<NaiveDate> {
    let created = record.created_at()?;
    let shifted = match record.utc_offset_minutes() {
        Some(minutes) => created + Duration::minutes(minutes),
        None => created,
    };
    Some(shifted.date_naive())
}

/// First candidate that reads as a finite number
///
/// Accepts JSON numbers and numeric strings; blanks and anything else are
/// skipped.
pub fn pick_number(candidates: &[Option<&Value>]) -> Option<f64> {
    candidates.iter().flatten().find_map(|value| match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

/// Fold records into overall and per-day totals
pub fn aggregate<'a, I>(records: I) -> Totals
where
    I: IntoIterator<Item = &'a Treatment>,
{
    let mut totals = Totals::default();

    for record in records {
        totals.entries += 1;
        let Some(day) = local_date(record) else {
            continue;
        };

        let meta = meta::decode(record.notes());
        let insulin = pick_number(&[record.get(FIELD_INSULIN), meta.get(meta::META_KEY_INSULIN)]);
        let carbs = pick_number(&[record.get(FIELD_CARBS), meta.get(meta::META_KEY_CARBS)]);
        let calories = pick_number(&[record.get(FIELD_CALORIES), meta.get(meta::META_KEY_CALORIES)]);

        totals.insulin += insulin.unwrap_or(0.0);
        totals.carbs += carbs.unwrap_or(0.0);
        totals.calories += calories.unwrap_or(0.0);

        let day_totals = totals.daily.entry(day).or_default();
        day_totals.entries += 1;
        day_totals.add(insulin, carbs, calories);
    }

    totals
}
