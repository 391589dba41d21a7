//! Apply a patch to a remote treatment, recreating it when the store refuses
//!
//! Some Nightscout deployments answer 404 to `PUT /api/v1/treatments/{id}`
//! for records that plainly exist. When the caller supplies the stored
//! document, the update falls back to delete + insert, and restores the
//! original document if the insert fails.
//!
//! ```text
//!   Apply ──2xx──────────────────────────────► done (in place)
//!     │ 404 + existing
//!     ▼
//!   Delete ──2xx/404──► Insert ──2xx─────────► done (recreated)
//!     │ other               │ failure
//!     ▼                     ▼
//!   error(delete)        Restore ───────────► error(recreate) + restore outcome
//! ```

use super::patch::Patch;
use super::record::Treatment;
use super::store::TreatmentStore;
use crate::errors::{BridgeError, ReconcileStage, RestoreOutcome, StoreError};
use crate::logger::{self, LogTag};
use serde_json::Value;

/// Which path produced the final state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePath {
    InPlace,
    Recreated,
}

impl ReconcilePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcilePath::InPlace => "in_place",
            ReconcilePath::Recreated => "recreated",
        }
    }
}

/// Remote calls issued, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Apply,
    Delete,
    Insert,
    Restore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub path: ReconcilePath,
    pub steps: Vec<Step>,
    /// Normalized body of the final successful call
    pub response: Value,
}

enum State<'a> {
    Apply,
    Delete(&'a Treatment),
    Insert(&'a Treatment),
    Restore {
        original: &'a Treatment,
        cause: StoreError,
    },
}

/// Run the update state machine for `id`
///
/// `existing` is the document as last read from the store; without it a 404
/// on apply is terminal.
pub async fn reconcile<S: TreatmentStore + ?Sized>(
    store: &S,
    id: &str,
    patch: &Patch,
    existing: Option<&Treatment>,
) -> Result<Reconciled, BridgeError> {
    let mut steps = Vec::new();
    let mut state = State::Apply;

    loop {
        state = match state {
            State::Apply => {
                steps.push(Step::Apply);
                match store.modify(id, patch).await {
                    Ok(reply) => {
                        logger::info(
                            LogTag::Reconcile,
                            &format!("Treatment '{}' updated in place ({})", id, patch.field_names()),
                        );
                        return Ok(Reconciled {
                            path: ReconcilePath::InPlace,
                            steps,
                            response: reply.into_value(),
                        });
                    }
                    Err(err) if err.is_not_found() => match existing {
                        Some(original) => {
                            logger::warning(
                                LogTag::Reconcile,
                                &format!("In-place update of '{}' returned 404, recreating", id),
                            );
                            State::Delete(original)
                        }
                        None => return Err(BridgeError::RemoteStore(err)),
                    },
                    Err(err) => return Err(BridgeError::RemoteStore(err)),
                }
            }

            State::Delete(original) => {
                steps.push(Step::Delete);
                match store.delete(id).await {
                    Ok(_) => State::Insert(original),
                    Err(err) if err.is_not_found() => {
                        logger::debug(
                            LogTag::Reconcile,
                            &format!("Treatment '{}' already gone before recreate", id),
                        );
                        State::Insert(original)
                    }
                    Err(err) => {
                        logger::error(
                            LogTag::Reconcile,
                            &format!("Delete of '{}' failed, nothing changed: {}", id, err),
                        );
                        return Err(BridgeError::Reconciliation {
                            stage: ReconcileStage::Delete,
                            source: err,
                            restore: RestoreOutcome::NotAttempted,
                        });
                    }
                }
            }

            State::Insert(original) => {
                steps.push(Step::Insert);
                let document = patch.apply_to(original).without_id();
                match store.insert(std::slice::from_ref(&document)).await {
                    Ok(reply) => {
                        logger::info(
                            LogTag::Reconcile,
                            &format!("Treatment '{}' recreated ({})", id, patch.field_names()),
                        );
                        return Ok(Reconciled {
                            path: ReconcilePath::Recreated,
                            steps,
                            response: reply.into_value(),
                        });
                    }
                    Err(cause) => State::Restore { original, cause },
                }
            }

            State::Restore { original, cause } => {
                steps.push(Step::Restore);
                let document = original.without_id();
                let restore = match store.insert(std::slice::from_ref(&document)).await {
                    Ok(_) => {
                        logger::warning(
                            LogTag::Reconcile,
                            &format!("Recreate of '{}' failed, original document restored", id),
                        );
                        RestoreOutcome::Restored
                    }
                    Err(restore_err) => {
                        logger::error(
                            LogTag::Reconcile,
                            &format!(
                                "Recreate of '{}' failed and restore failed too, record is missing: {}",
                                id, restore_err
                            ),
                        );
                        RestoreOutcome::Failed(restore_err.to_string())
                    }
                };
                return Err(BridgeError::Reconciliation {
                    stage: ReconcileStage::Recreate,
                    source: cause,
                    restore,
                });
            }
        };
    }
}
