//! Metadata embedded in the treatment `notes` field
//!
//! Older Nightscout versions drop unknown fields, so extension values are also
//! kept as a compact JSON object inside `notes`, behind the [`META_PREFIX`]
//! sentinel. Notes without the sentinel belong to someone else and are never
//! parsed or rewritten.

use serde_json::{Map, Value};

/// Sentinel marking notes owned by this bridge
pub const META_PREFIX: &str = "[alice-meta]";

/// Schema version seeded into freshly created metadata
pub const META_VERSION: i64 = 1;

pub const META_KEY_VERSION: &str = "ver";
pub const META_KEY_INSULIN: &str = "insulin_u";
pub const META_KEY_CARBS: &str = "carbs_g";
pub const META_KEY_CALORIES: &str = "calories_kcal";
pub const META_KEY_PROTEIN: &str = "protein_g";
pub const META_KEY_MEAL: &str = "meal";
pub const META_KEY_PHOTO_URL: &str = "photoUrl";

pub type Metadata = Map<String, Value>;

/// Decode the metadata object from `notes`
///
/// Returns an empty map for empty notes, foreign notes, or a payload that is
/// not a JSON object.
pub fn decode(notes: Option<&str>) -> Metadata {
    let Some(payload) = notes.and_then(|n| n.strip_prefix(META_PREFIX)) else {
        return Metadata::new();
    };

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => map,
        _ => Metadata::new(),
    }
}

/// Merge `updates` into the metadata carried by `notes`
///
/// A null update removes the key. Returns `notes` unchanged when there is
/// nothing to merge or when the notes hold foreign text.
pub fn encode(notes: Option<&str>, updates: &Metadata) -> Option<String> {
    if updates.is_empty() {
        return notes.map(str::to_string);
    }

    let notes_empty = notes.map_or(true, str::is_empty);
    let mut meta = decode(notes);

    if meta.is_empty() {
        if !notes_empty {
            return notes.map(str::to_string);
        }
        meta.insert(META_KEY_VERSION.to_string(), Value::from(META_VERSION));
    }

    for (key, value) in updates {
        if value.is_null() {
            meta.remove(key);
        } else {
            meta.insert(key.clone(), value.clone());
        }
    }

    // Map<String, Value> always serializes
    let payload = serde_json::to_string(&meta).unwrap_or_else(|_| "{}".to_string());
    Some(format!("{}{}", META_PREFIX, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn updates(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => panic!("updates must be an object"),
        }
    }

    #[test]
    fn test_decode_rejects_foreign_and_broken_notes() {
        assert!(decode(None).is_empty());
        assert!(decode(Some("")).is_empty());
        assert!(decode(Some("ate pizza")).is_empty());
        assert!(decode(Some("[alice-meta]{not json")).is_empty());
        assert!(decode(Some("[alice-meta][1,2]")).is_empty());

        let meta = decode(Some(r#"[alice-meta]{"ver":1,"meal":"soup"}"#));
        assert_eq!(meta.get("meal"), Some(&json!("soup")));
    }

    #[test]
    fn test_encode_seeds_version_on_empty_notes() {
        let encoded = encode(Some(""), &updates(json!({"insulin_u": 3.5}))).unwrap();
        assert!(encoded.starts_with(META_PREFIX));

        let meta = decode(Some(&encoded));
        assert_eq!(meta.get("ver"), Some(&json!(1)));
        assert_eq!(meta.get("insulin_u"), Some(&json!(3.5)));

        assert!(encode(None, &updates(json!({"meal": "soup"}))).is_some());
    }

    #[test]
    fn test_encode_is_identity_for_foreign_notes() {
        let notes = Some("written by the pump");
        assert_eq!(
            encode(notes, &updates(json!({"meal": "soup"}))).as_deref(),
            notes
        );

        let broken = Some("[alice-meta]{oops");
        assert_eq!(encode(broken, &updates(json!({"meal": "soup"}))).as_deref(), broken);
    }

    #[test]
    fn test_encode_merges_and_removes() {
        let notes = r#"[alice-meta]{"ver":1,"meal":"soup","photoUrl":"http://x/a.jpg"}"#;
        let encoded = encode(
            Some(notes),
            &updates(json!({"meal": "borscht", "photoUrl": null, "protein_g": 12})),
        )
        .unwrap();

        let meta = decode(Some(&encoded));
        assert_eq!(meta.get("meal"), Some(&json!("borscht")));
        assert_eq!(meta.get("protein_g"), Some(&json!(12)));
        assert!(!meta.contains_key("photoUrl"));
        assert_eq!(meta.get("ver"), Some(&json!(1)));
    }

    #[test]
    fn test_encode_is_compact_and_keeps_unicode() {
        let encoded = encode(None, &updates(json!({"meal": "борщ"}))).unwrap();
        assert!(!encoded.contains(' '));
        assert!(encoded.contains("борщ"));
    }

    #[test]
    fn test_empty_updates_return_notes_unchanged() {
        assert_eq!(encode(Some("anything"), &Metadata::new()).as_deref(), Some("anything"));
        assert_eq!(encode(None, &Metadata::new()), None);
    }
}
