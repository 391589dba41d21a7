use crate::webserver::{state::AppState, utils::success_response};
use axum::{extract::State, response::Response, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::services::ServeDir;

pub mod treatment;
pub mod upload;

pub fn create_router(state: Arc<AppState>) -> Router {
    let webapp = ServeDir::new(&state.config.webserver.webapp_dir);
    Router::new()
        .route("/healthz", get(health_check))
        .nest("/api", api_routes(state.config.media.max_upload_bytes))
        .nest_service("/webapp", webapp)
        .with_state(state)
}

fn api_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .merge(treatment::routes())
        .merge(upload::routes(max_upload_bytes))
}

/// GET /healthz
async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let uptime_seconds = (chrono::Utc::now() - state.startup_time).num_seconds().max(0);
    success_response(json!({
        "status": "ok",
        "uptime_seconds": uptime_seconds,
    }))
}


#[cfg(test)]
mod tests {
    use super::test_support::{app_with_store, read_json};
    use crate::treatments::fake::FakeStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthz() {
        let app = app_with_store(Arc::new(FakeStore::new()));
        let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
    }

    #[tokio::test]
    async fn test_serves_webapp_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>editor</html>").unwrap();
        let mut config = super::test_support::test_config();
        config.webserver.webapp_dir = dir.path().to_string_lossy().to_string();
        let app = super::test_support::app_with_config(config, Arc::new(FakeStore::new()));

        let request = Request::builder()
            .uri("/webapp/index.html")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
