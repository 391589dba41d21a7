use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::errors::BridgeError;
use crate::logger::{self, LogTag};
use crate::treatments::{RawTreatmentInput, UpdateRequest};
use crate::webserver::{
    state::AppState,
    utils::{bridge_error_response, success_response},
};

// =============================================================================
// REQUEST TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TreatmentQuery {
    pub cid: Option<String>,
    #[serde(rename = "initData")]
    pub init_data: Option<String>,
}

/// Form posted by the mini-app editor
#[derive(Debug, Default, Deserialize)]
pub struct TreatmentForm {
    #[serde(rename = "initData")]
    pub init_data: Option<String>,
    pub id: Option<String>,
    pub cid: Option<String>,
    #[serde(rename = "eventType")]
    pub event_type: Option<String>,
    pub insulin: Option<String>,
    pub carbs: Option<String>,
    pub calories: Option<String>,
    pub protein: Option<String>,
    pub meal: Option<String>,
    #[serde(rename = "photoUrl")]
    pub photo_url: Option<String>,
}

impl TreatmentForm {
    fn into_request(self) -> Result<UpdateRequest, BridgeError> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| BridgeError::validation("Missing id"))?;

        Ok(UpdateRequest {
            id,
            client_id: self.cid.filter(|cid| !cid.is_empty()),
            values: RawTreatmentInput {
                event_type: self.event_type,
                insulin: self.insulin,
                carbs: self.carbs,
                calories: self.calories,
                protein: self.protein,
                meal: self.meal,
                photo_url: self.photo_url,
            },
        })
    }
}

// =============================================================================
// ROUTES
// =============================================================================

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/treatment", get(get_treatment).put(update_treatment))
}

/// GET /api/treatment?cid=..&initData=..
async fn get_treatment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TreatmentQuery>,
) -> Response {
    let result = async {
        state.verify(query.init_data.as_deref())?;
        let cid = query
            .cid
            .filter(|cid| !cid.is_empty())
            .ok_or_else(|| BridgeError::validation("Missing cid"))?;
        state.service.view_by_client_id(&cid).await
    }
    .await;

    match result {
        Ok(view) => success_response(view),
        Err(e) => bridge_error_response(&e),
    }
}

/// PUT /api/treatment
async fn update_treatment(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TreatmentForm>,
) -> Response {
    let result = async {
        let verified = state.verify(form.init_data.as_deref())?;
        let request = form.into_request()?;
        logger::info(
            LogTag::Webserver,
            &format!(
                "Update of treatment '{}' requested by user {}",
                request.id, verified.user_id
            ),
        );
        state.service.update(request).await
    }
    .await;

    match result {
        Ok(outcome) => success_response(json!({ "status": "ok", "updated": outcome.updated })),
        Err(e) => bridge_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treatments::fake::{FakeStore, StoreCall};
    use crate::webserver::routes::test_support::{app_with_store, read_json, signed_init_data};
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn form_body(pairs: &[(&str, &str)]) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    }

    fn put_request(body: String) -> Request<Body> {
        Request::builder()
            .method(Method::PUT)
            .uri("/api/treatment")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_treatment_view() {
        let store = Arc::new(FakeStore::with_records(vec![json!({
            "_id": "A",
            "clientId": "c-1",
            "eventType": "Meal Bolus",
            "insulin": 2.0,
            "carbs": 40,
            "notes": "[alice-meta]{\"meal\":\"soup\"}"
        })]));
        let app = app_with_store(store.clone());

        let query = form_body(&[("cid", "c-1"), ("initData", &signed_init_data(42))]);
        let request = Request::builder()
            .uri(format!("/api/treatment?{}", query))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        assert_eq!(body["id"], "A");
        assert_eq!(body["eventType"], "Meal Bolus");
        assert_eq!(body["meal"], "soup");
    }

    #[tokio::test]
    async fn test_get_treatment_rejects_bad_signature_without_lookup() {
        let store = Arc::new(FakeStore::new());
        let app = app_with_store(store.clone());

        let tampered = signed_init_data(42).replace("auth_date=1700000000", "auth_date=1700000001");
        let query = form_body(&[("cid", "c-1"), ("initData", &tampered)]);
        let request = Request::builder()
            .uri(format!("/api/treatment?{}", query))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = read_json(response).await;
        assert_eq!(body["detail"], "Invalid signature");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_treatment_foreign_user() {
        let store = Arc::new(FakeStore::new());
        let app = app_with_store(store.clone());

        let query = form_body(&[("cid", "c-1"), ("initData", &signed_init_data(7))]);
        let request = Request::builder()
            .uri(format!("/api/treatment?{}", query))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = read_json(response).await;
        assert_eq!(body["detail"], "User is not allowed");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_put_treatment_applies_patch() {
        let store = Arc::new(FakeStore::with_records(vec![json!({
            "_id": "A",
            "insulin": 2.0,
            "notes": ""
        })]));
        let app = app_with_store(store.clone());

        let body = form_body(&[
            ("initData", &signed_init_data(42)),
            ("id", "A"),
            ("insulin", "3.5"),
        ]);
        let response = app.oneshot(put_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        assert_eq!(body, json!({ "status": "ok", "updated": true }));

        let mutations = store.mutations();
        assert_eq!(mutations.len(), 1);
        match &mutations[0] {
            StoreCall::Modify { id, patch } => {
                assert_eq!(id, "A");
                assert_eq!(patch["insulin"], json!(3.5));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_put_treatment_unchanged_values() {
        let store = Arc::new(FakeStore::with_records(vec![json!({
            "_id": "A",
            "insulin": 2.0
        })]));
        let app = app_with_store(store.clone());

        let body = form_body(&[
            ("initData", &signed_init_data(42)),
            ("id", "A"),
            ("insulin", "2"),
        ]);
        let response = app.oneshot(put_request(body)).await.unwrap();

        let body: Value = read_json(response).await;
        assert_eq!(body, json!({ "status": "ok", "updated": false }));
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_put_treatment_validation_before_lookup() {
        let store = Arc::new(FakeStore::with_records(vec![json!({ "_id": "A" })]));
        let app = app_with_store(store.clone());

        let body = form_body(&[
            ("initData", &signed_init_data(42)),
            ("id", "A"),
            ("insulin", "80"),
        ]);
        let response = app.oneshot(put_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_put_treatment_missing_record() {
        let store = Arc::new(FakeStore::new());
        let app = app_with_store(store.clone());

        let body = form_body(&[
            ("initData", &signed_init_data(42)),
            ("id", "missing"),
            ("cid", "c-9"),
        ]);
        let response = app.oneshot(put_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::FindById("missing".to_string()),
                StoreCall::FindByClientId("c-9".to_string()),
            ]
        );
    }
}
