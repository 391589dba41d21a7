//! Resolve the record a mini-app link points at
//!
//! Links carry the primary `_id` and usually the uploader's `clientId`. The
//! `_id` changes when a record is recreated, so a miss on `_id` falls back to
//! `clientId` and the record's own `_id` becomes the target.

use super::record::Treatment;
use super::store::TreatmentStore;
use crate::errors::BridgeError;
use crate::logger::{self, LogTag};

/// A resolved record and the id every subsequent call must use
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub target_id: String,
    pub record: Treatment,
}

pub async fn locate<S: TreatmentStore + ?Sized>(
    store: &S,
    id: &str,
    client_id: Option<&str>,
) -> Result<Located, BridgeError> {
    let id = id.trim();
    if !id.is_empty() {
        if let Some(record) = store.find_by_id(id).await? {
            let target_id = record.id().unwrap_or(id).to_string();
            return Ok(Located { target_id, record });
        }
    }

    let Some(cid) = client_id.map(str::trim).filter(|c| !c.is_empty()) else {
        return Err(BridgeError::NotFound);
    };

    let Some(record) = store.find_by_client_id(cid).await? else {
        return Err(BridgeError::NotFound);
    };

    let target_id = record.id().unwrap_or(id).to_string();
    if target_id.is_empty() {
        return Err(BridgeError::NotFound);
    }
    if target_id != id {
        logger::info(
            LogTag::Store,
            &format!(
                "Treatment '{}' resolved through clientId '{}' to '{}'",
                id, cid, target_id
            ),
        );
    }

    Ok(Located { target_id, record })
}
