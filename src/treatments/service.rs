//! Treatment operations behind the mini-app API

use super::locator::locate;
use super::meta;
use super::patch::{compute_patch, RawTreatmentInput};
use super::reconcile::{reconcile, ReconcilePath};
use super::record::*;
use super::store::TreatmentStore;
use crate::errors::BridgeError;
use crate::logger::{self, LogTag};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// What the mini-app form is populated with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentView {
    pub id: Option<String>,
    #[serde(rename = "eventType")]
    pub event_type: String,
    pub insulin: Value,
    pub carbs: Value,
    pub calories: Value,
    pub protein: Value,
    pub meal: Value,
    #[serde(rename = "photoUrl")]
    pub photo_url: Value,
    pub notes: Value,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub id: String,
    pub client_id: Option<String>,
    pub values: RawTreatmentInput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub updated: bool,
    /// `None` when the patch was empty and nothing was sent
    pub path: Option<ReconcilePath>,
    pub response: Option<Value>,
}

pub struct TreatmentService<S: TreatmentStore + ?Sized> {
    store: Arc<S>,
}

impl<S: TreatmentStore + ?Sized> Clone for TreatmentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: TreatmentStore + ?Sized> TreatmentService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn view_by_client_id(&self, client_id: &str) -> Result<TreatmentView, BridgeError> {
        let record = self
            .store
            .find_by_client_id(client_id)
            .await?
            .ok_or(BridgeError::NotFound)?;
        Ok(build_view(&record))
    }

    /// Validate, locate, diff and reconcile one update
    pub async fn update(&self, request: UpdateRequest) -> Result<UpdateOutcome, BridgeError> {
        let requested = request.values.validate()?;
        let located = locate(
            self.store.as_ref(),
            &request.id,
            request.client_id.as_deref(),
        )
        .await?;

        let patch = compute_patch(&located.record, &requested);
        if patch.is_empty() {
            logger::debug(
                LogTag::Reconcile,
                &format!("No changes for treatment '{}'", located.target_id),
            );
            return Ok(UpdateOutcome {
                updated: false,
                path: None,
                response: None,
            });
        }

        let result = reconcile(
            self.store.as_ref(),
            &located.target_id,
            &patch,
            Some(&located.record),
        )
        .await?;

        Ok(UpdateOutcome {
            updated: true,
            path: Some(result.path),
            response: Some(result.response),
        })
    }
}

fn build_view(record: &Treatment) -> TreatmentView {
    let meta = meta::decode(record.notes());
    let with_fallback = |field: &str, meta_key: &str| -> Value {
        match record.get(field) {
            Some(value) if !is_blank(value) => value.clone(),
            _ => meta.get(meta_key).cloned().unwrap_or(Value::Null),
        }
    };

    TreatmentView {
        id: record.id().map(str::to_string),
        event_type: record
            .str_field(FIELD_EVENT_TYPE)
            .unwrap_or("None")
            .to_string(),
        insulin: record.get_or_null(FIELD_INSULIN),
        carbs: record.get_or_null(FIELD_CARBS),
        calories: with_fallback(FIELD_CALORIES, meta::META_KEY_CALORIES),
        protein: with_fallback(FIELD_PROTEIN, meta::META_KEY_PROTEIN),
        meal: with_fallback(FIELD_MEAL, meta::META_KEY_MEAL),
        photo_url: with_fallback(FIELD_PHOTO_URL, meta::META_KEY_PHOTO_URL),
        notes: record.get_or_null(FIELD_NOTES),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
