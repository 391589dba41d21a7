//! Treatment documents as stored by Nightscout
//!
//! Nightscout treatments are open JSON documents: besides the handful of
//! fields this crate reads, a record may carry anything the uploading client
//! put there. [`Treatment`] keeps the whole map so a recreate never loses
//! unknown keys.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Field names used on the wire
pub const FIELD_ID: &str = "_id";
pub const FIELD_CLIENT_ID: &str = "clientId";
pub const FIELD_EVENT_TYPE: &str = "eventType";
pub const FIELD_INSULIN: &str = "insulin";
pub const FIELD_CARBS: &str = "carbs";
pub const FIELD_CALORIES: &str = "calories_kcal";
pub const FIELD_PROTEIN: &str = "protein_g";
pub const FIELD_MEAL: &str = "meal";
pub const FIELD_PHOTO_URL: &str = "photoUrl";
pub const FIELD_NOTES: &str = "notes";
pub const FIELD_CREATED_AT: &str = "created_at";
pub const FIELD_CREATED_AT_CAMEL: &str = "createdAt";
pub const FIELD_UTC_OFFSET: &str = "utcOffset";

/// One treatment document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Treatment(pub Map<String, Value>);

impl Treatment {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build from a JSON value; anything other than an object is rejected
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Value of `field`, with a missing key reported as JSON null
    pub fn get_or_null(&self, field: &str) -> Value {
        self.0.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Non-empty string value of `field`
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field(FIELD_ID)
    }

    pub fn client_id(&self) -> Option<&str> {
        self.str_field(FIELD_CLIENT_ID)
    }

    pub fn notes(&self) -> Option<&str> {
        self.0.get(FIELD_NOTES).and_then(Value::as_str)
    }

    /// Copy of the document without its primary id, ready for insertion
    pub fn without_id(&self) -> Treatment {
        let mut copy = self.clone();
        copy.remove(FIELD_ID);
        copy
    }

    /// Creation time in UTC, read from `created_at` or `createdAt`
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = [FIELD_CREATED_AT, FIELD_CREATED_AT_CAMEL]
            .iter()
            .find_map(|field| self.str_field(field))?;
        parse_timestamp(raw)
    }

    /// UTC offset annotation in whole minutes; zero and non-numeric values are ignored
    pub fn utc_offset_minutes(&self) -> Option<i64> {
        let offset = self.0.get(FIELD_UTC_OFFSET)?.as_f64()?;
        if offset == 0.0 {
            return None;
        }
        Some(offset.trunc() as i64)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Treatment {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Parse the timestamp shapes Nightscout uploaders produce
///
/// Accepts RFC 3339 (`Z` or numeric offset), a space instead of `T`, offsets
/// without a colon, and naive timestamps (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim().replacen(' ', "T", 1);
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(&text, pattern) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&text, pattern) {
            return Some(naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(value: Value) -> Treatment {
        Treatment::from_value(value).unwrap()
    }

    #[test]
    fn test_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T13:30:00+03:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T13:30:00+0300"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_created_at_falls_back_to_camel_case() {
        let treatment = record(json!({"createdAt": "2024-03-01T10:30:00Z"}));
        assert!(treatment.created_at().is_some());

        let treatment = record(json!({"created_at": 1709288400}));
        assert!(treatment.created_at().is_none());
    }

    #[test]
    fn test_utc_offset() {
        assert_eq!(record(json!({"utcOffset": 180})).utc_offset_minutes(), Some(180));
        assert_eq!(record(json!({"utcOffset": -90.7})).utc_offset_minutes(), Some(-90));
        assert_eq!(record(json!({"utcOffset": 0})).utc_offset_minutes(), None);
        assert_eq!(record(json!({"utcOffset": "180"})).utc_offset_minutes(), None);
    }

    #[test]
    fn test_without_id_keeps_other_fields() {
        let treatment = record(json!({"_id": "A", "insulin": 2.0, "enteredBy": "pump"}));
        let copy = treatment.without_id();
        assert_eq!(copy.id(), None);
        assert_eq!(copy.get("enteredBy"), Some(&json!("pump")));
        assert_eq!(treatment.id(), Some("A"));
    }
}
