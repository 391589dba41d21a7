//! Minimal patch computation for treatment updates
//!
//! The mini-app always submits every field, so each value is compared with
//! what the store already holds and only real differences are sent. Extension
//! fields are written twice: as first-class attributes for stores that keep
//! them, and into the notes metadata for stores that drop them.

use super::meta::{self, Metadata};
use super::record::*;
use crate::errors::BridgeError;
use serde_json::{Map, Number, Value};

/// Event types the mini-app may set
pub const ALLOWED_EVENT_TYPES: [&str; 3] = ["Meal Bolus", "Carb Correction", "Correction Bolus"];

const REL_TOLERANCE: f64 = 1e-6;
const ABS_TOLERANCE: f64 = 1e-6;

/// Raw values as submitted by the mini-app form
#[derive(Debug, Clone, Default)]
pub struct RawTreatmentInput {
    pub event_type: Option<String>,
    pub insulin: Option<String>,
    pub carbs: Option<String>,
    pub calories: Option<String>,
    pub protein: Option<String>,
    pub meal: Option<String>,
    pub photo_url: Option<String>,
}

/// Validated requested values; `None` means "cleared"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestedValues {
    pub event_type: Option<String>,
    pub insulin: Option<f64>,
    pub carbs: Option<f64>,
    pub calories: Option<i64>,
    pub protein: Option<i64>,
    pub meal: Option<String>,
    pub photo_url: Option<String>,
}

impl RawTreatmentInput {
    /// Validate and normalize every field
    pub fn validate(&self) -> Result<RequestedValues, BridgeError> {
        Ok(RequestedValues {
            event_type: normalize_event_type(self.event_type.as_deref())?,
            insulin: parse_optional_float(self.insulin.as_deref(), "insulin", 0.0, 50.0)?,
            carbs: parse_optional_float(self.carbs.as_deref(), "carbs", 0.0, 2000.0)?,
            calories: parse_optional_int(self.calories.as_deref(), "calories", 0, 100_000)?,
            protein: parse_optional_int(self.protein.as_deref(), "protein", 0, 10_000)?,
            meal: clean_text(self.meal.as_deref()),
            photo_url: clean_text(self.photo_url.as_deref()),
        })
    }
}

/// Field name → new value for one update call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(pub Map<String, Value>);

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Comma-separated field names, for logs
    pub fn field_names(&self) -> String {
        self.0.keys().cloned().collect::<Vec<_>>().join(",")
    }

    /// Copy of `base` with every patched field overwritten
    pub fn apply_to(&self, base: &Treatment) -> Treatment {
        let mut merged = base.clone();
        for (field, value) in &self.0 {
            merged.insert(field.clone(), value.clone());
        }
        merged
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// True when `requested` differs from `current` under the tolerance rule
///
/// Numbers compare equal within 1e-6 (relative or absolute), two nulls are
/// equal, everything else uses exact JSON equality.
pub fn is_different(current: &Value, requested: &Value) -> bool {
    if current.is_null() && requested.is_null() {
        return false;
    }
    if let (Some(a), Some(b)) = (current.as_f64(), requested.as_f64()) {
        if current.is_number() && requested.is_number() {
            return !is_close(a, b);
        }
    }
    current != requested
}

fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    diff <= (REL_TOLERANCE * a.abs().max(b.abs())).max(ABS_TOLERANCE)
}

/// Diff `requested` against `current` and build the patch
pub fn compute_patch(current: &Treatment, requested: &RequestedValues) -> Patch {
    let mut patch = Patch::default();
    let mut meta_updates = Metadata::new();

    let event_type = opt_string(&requested.event_type);
    if is_different(&current.get_or_null(FIELD_EVENT_TYPE), &event_type) {
        patch.insert(FIELD_EVENT_TYPE, event_type);
    }

    let insulin = opt_float(requested.insulin);
    if is_different(&current.get_or_null(FIELD_INSULIN), &insulin) {
        patch.insert(FIELD_INSULIN, insulin.clone());
        meta_updates.insert(meta::META_KEY_INSULIN.to_string(), insulin);
    }

    let carbs = opt_float(requested.carbs);
    if is_different(&current.get_or_null(FIELD_CARBS), &carbs) {
        patch.insert(FIELD_CARBS, carbs);
        // Metadata keeps whole grams
        let grams = requested
            .carbs
            .map(|c| Value::from(c.trunc() as i64))
            .unwrap_or(Value::Null);
        meta_updates.insert(meta::META_KEY_CARBS.to_string(), grams);
    }

    let calories = opt_int(requested.calories);
    if is_different(&current.get_or_null(FIELD_CALORIES), &calories) {
        patch.insert(FIELD_CALORIES, calories.clone());
        meta_updates.insert(meta::META_KEY_CALORIES.to_string(), calories);
    }

    let protein = opt_int(requested.protein);
    if is_different(&current.get_or_null(FIELD_PROTEIN), &protein) {
        patch.insert(FIELD_PROTEIN, protein.clone());
        meta_updates.insert(meta::META_KEY_PROTEIN.to_string(), protein);
    }

    let meal = opt_string(&requested.meal);
    if is_different(&current.get_or_null(FIELD_MEAL), &meal) {
        patch.insert(FIELD_MEAL, meal.clone());
        meta_updates.insert(meta::META_KEY_MEAL.to_string(), meal);
    }

    let photo_url = opt_string(&requested.photo_url);
    if is_different(&current.get_or_null(FIELD_PHOTO_URL), &photo_url) {
        patch.insert(FIELD_PHOTO_URL, photo_url.clone());
        meta_updates.insert(meta::META_KEY_PHOTO_URL.to_string(), photo_url);
    }

    let current_notes = current.notes();
    let new_notes = meta::encode(current_notes, &meta_updates);
    if new_notes.as_deref() != current_notes {
        patch.insert(FIELD_NOTES, opt_string(&new_notes));
    }

    patch
}

// =============================================================================
// INPUT PARSING
// =============================================================================

fn normalize_event_type(raw: Option<&str>) -> Result<Option<String>, BridgeError> {
    let Some(value) = raw.map(str::trim) else {
        return Ok(None);
    };
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if !ALLOWED_EVENT_TYPES.contains(&value) {
        return Err(BridgeError::validation("Unsupported eventType"));
    }
    Ok(Some(value.to_string()))
}

fn parse_optional_float(
    raw: Option<&str>,
    field: &str,
    min: f64,
    max: f64,
) -> Result<Option<f64>, BridgeError> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let value: f64 = text
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| BridgeError::validation(format!("Invalid {}", field)))?;
    if !(min..=max).contains(&value) {
        return Err(BridgeError::validation(format!("{} out of range", field)));
    }
    Ok(Some(value))
}

/// Integers may arrive as "12.0"; the fractional part is dropped
fn parse_optional_int(
    raw: Option<&str>,
    field: &str,
    min: i64,
    max: i64,
) -> Result<Option<i64>, BridgeError> {
    let Some(value) = parse_optional_float(raw, field, f64::MIN, f64::MAX)? else {
        return Ok(None);
    };
    let truncated = value.trunc();
    if truncated < min as f64 || truncated > max as f64 {
        return Err(BridgeError::validation(format!("{} out of range", field)));
    }
    Ok(Some(truncated as i64))
}

fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn opt_float(value: Option<f64>) -> Value {
    value
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn opt_int(value: Option<i64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}
