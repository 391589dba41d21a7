//! Scripted in-memory store used by unit tests
//!
//! Every call is recorded in order. Lookups answer from the seeded records,
//! mutating calls pop a scripted result (success with an empty body when the
//! script runs dry), and range pages are cut from the seeded records the way
//! Nightscout does it.

use super::patch::Patch;
use super::record::Treatment;
use super::store::{RangePage, StoreReply, TreatmentStore};
use crate::errors::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    FindById(String),
    FindByClientId(String),
    Modify { id: String, patch: Value },
    Delete(String),
    Insert(Vec<Value>),
    FetchPage(RangePage),
}

type Scripted = Mutex<VecDeque<Result<StoreReply, StoreError>>>;

#[derive(Default)]
pub struct FakeStore {
    records: Mutex<Vec<Treatment>>,
    lookup_error: Mutex<Option<StoreError>>,
    modify_results: Scripted,
    delete_results: Scripted,
    insert_results: Scripted,
    calls: Mutex<Vec<StoreCall>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Value>) -> Self {
        let store = Self::new();
        *store.records.lock().unwrap() = records
            .into_iter()
            .map(|r| Treatment::from_value(r).expect("record must be an object"))
            .collect();
        store
    }

    pub fn fail_lookups(&self, err: StoreError) {
        *self.lookup_error.lock().unwrap() = Some(err);
    }

    pub fn script_modify(&self, result: Result<StoreReply, StoreError>) {
        self.modify_results.lock().unwrap().push_back(result);
    }

    pub fn script_delete(&self, result: Result<StoreReply, StoreError>) {
        self.delete_results.lock().unwrap().push_back(result);
    }

    pub fn script_insert(&self, result: Result<StoreReply, StoreError>) {
        self.insert_results.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the mutating calls, for asserting on the reconcile sequence
    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    StoreCall::Modify { .. } | StoreCall::Delete(_) | StoreCall::Insert(_)
                )
            })
            .collect()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, field: &str, value: &str) -> Result<Option<Treatment>, StoreError> {
        if let Some(err) = self.lookup_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.str_field(field) == Some(value))
            .cloned())
    }

    fn next(script: &Scripted) -> Result<StoreReply, StoreError> {
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StoreReply::empty()))
    }
}

#[async_trait]
impl TreatmentStore for FakeStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Treatment>, StoreError> {
        self.record(StoreCall::FindById(id.to_string()));
        self.lookup("_id", id)
    }

    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Treatment>, StoreError> {
        self.record(StoreCall::FindByClientId(client_id.to_string()));
        self.lookup("clientId", client_id)
    }

    async fn modify(&self, id: &str, patch: &Patch) -> Result<StoreReply, StoreError> {
        self.record(StoreCall::Modify {
            id: id.to_string(),
            patch: patch.to_value(),
        });
        Self::next(&self.modify_results)
    }

    async fn delete(&self, id: &str) -> Result<StoreReply, StoreError> {
        self.record(StoreCall::Delete(id.to_string()));
        Self::next(&self.delete_results)
    }

    async fn insert(&self, documents: &[Treatment]) -> Result<StoreReply, StoreError> {
        self.record(StoreCall::Insert(
            documents.iter().cloned().map(Treatment::into_value).collect(),
        ));
        Self::next(&self.insert_results)
    }

    async fn fetch_page(&self, page: &RangePage) -> Result<Vec<Treatment>, StoreError> {
        self.record(StoreCall::FetchPage(page.clone()));
        if let Some(err) = self.lookup_error.lock().unwrap().clone() {
            return Err(err);
        }

        let mut rows: Vec<Treatment> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.created_at().map_or(false, |ts| page.contains(ts)))
            .cloned()
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        rows.truncate(page.count);
        Ok(rows)
    }
}
