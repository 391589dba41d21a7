//! The remote treatment store seam
//!
//! [`TreatmentStore`] is the only way the bridge talks to Nightscout. The
//! production implementation lives in `apis::nightscout`; tests script an
//! in-memory fake.

use super::patch::Patch;
use super::record::Treatment;
use crate::errors::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// One page request of a created-at range scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePage {
    /// Inclusive lower bound
    pub start: DateTime<Utc>,
    /// Upper bound; tightened to the oldest row seen as paging proceeds
    pub end: DateTime<Utc>,
    /// `end` is exclusive on the first page and inclusive on cursor pages
    pub end_inclusive: bool,
    pub count: usize,
}

impl RangePage {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && (ts < self.end || (self.end_inclusive && ts == self.end))
    }
}

/// Raw 2xx response of a mutating call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreReply {
    pub status: u16,
    pub body: String,
    pub content_type: Option<String>,
}

impl StoreReply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            content_type: Some("application/json".to_string()),
        }
    }

    pub fn empty() -> Self {
        Self {
            status: 200,
            ..Self::default()
        }
    }

    /// Normalize the body into a JSON value
    ///
    /// Empty body → `{"status":"ok"}`; a body that parses as JSON → the
    /// parsed value, whatever the content type; anything else →
    /// `{"status": <trimmed text or "ok">}`.
    pub fn into_value(self) -> Value {
        if self.body.is_empty() {
            return json!({"status": "ok"});
        }

        if let Ok(value) = serde_json::from_str::<Value>(&self.body) {
            return value;
        }

        let text = self.body.trim();
        let status = if text.is_empty() { "ok" } else { text };
        json!({ "status": status })
    }
}

#[async_trait]
pub trait TreatmentStore: Send + Sync {
    /// Filtered lookup by primary `_id`
    async fn find_by_id(&self, id: &str) -> Result<Option<Treatment>, StoreError>;

    /// Filtered lookup by the uploader's `clientId`
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Treatment>, StoreError>;

    /// In-place update of one document
    async fn modify(&self, id: &str, patch: &Patch) -> Result<StoreReply, StoreError>;

    async fn delete(&self, id: &str) -> Result<StoreReply, StoreError>;

    /// Insert documents; the store assigns fresh ids
    async fn insert(&self, documents: &[Treatment]) -> Result<StoreReply, StoreError>;

    /// One page of records with `created_at` in `[start, end)` (or
    /// `[start, end]` when `end_inclusive`), newest first
    async fn fetch_page(&self, page: &RangePage) -> Result<Vec<Treatment>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_normalization() {
        assert_eq!(StoreReply::empty().into_value(), json!({"status": "ok"}));

        let reply = StoreReply::json(json!([{"_id": "B"}]));
        assert_eq!(reply.into_value(), json!([{"_id": "B"}]));

        let reply = StoreReply {
            status: 200,
            body: "  Created \n".to_string(),
            content_type: Some("text/plain".to_string()),
        };
        assert_eq!(reply.into_value(), json!({"status": "Created"}));

        let reply = StoreReply {
            status: 200,
            body: "   ".to_string(),
            content_type: None,
        };
        assert_eq!(reply.into_value(), json!({"status": "ok"}));
    }

    #[test]
    fn test_json_body_parsed_without_json_content_type() {
        let reply = StoreReply {
            status: 200,
            body: r#"{"n":1,"ok":1}"#.to_string(),
            content_type: Some("text/html; charset=utf-8".to_string()),
        };
        assert_eq!(reply.into_value(), json!({"n": 1, "ok": 1}));

        let reply = StoreReply {
            status: 200,
            body: r#"[{"_id":"B"}]"#.to_string(),
            content_type: None,
        };
        assert_eq!(reply.into_value(), json!([{"_id": "B"}]));
    }

    #[test]
    fn test_broken_json_falls_back_to_text() {
        let reply = StoreReply {
            status: 200,
            body: "{oops".to_string(),
            content_type: Some("application/json; charset=utf-8".to_string()),
        };
        assert_eq!(reply.into_value(), json!({"status": "{oops"}));
    }
}
