//! Nightscout treatment reconciliation
//!
//! ```text
//! treatments/
//! ├── record.rs     # Treatment document + timestamp parsing
//! ├── meta.rs       # [alice-meta] payload inside notes
//! ├── patch.rs      # Input validation and minimal patches
//! ├── store.rs      # TreatmentStore seam
//! ├── locator.rs    # _id / clientId resolution
//! ├── reconcile.rs  # Apply → Delete → Insert → Restore
//! ├── aggregate.rs  # Range paging and daily totals
//! └── service.rs    # Operations used by the HTTP layer
//! ```

pub mod aggregate;
pub mod locator;
pub mod meta;
pub mod patch;
pub mod reconcile;
pub mod record;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod fake;

pub use aggregate::{aggregate, fetch_range, DayTotals, RangeFetch, Totals};
pub use locator::{locate, Located};
pub use patch::{compute_patch, is_different, Patch, RawTreatmentInput, RequestedValues};
pub use reconcile::{reconcile, ReconcilePath, Reconciled, Step};
pub use record::Treatment;
pub use service::{TreatmentService, TreatmentView, UpdateOutcome, UpdateRequest};
pub use store::{RangePage, StoreReply, TreatmentStore};
