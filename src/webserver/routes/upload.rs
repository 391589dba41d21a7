use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Response,
    routing::post,
    Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::errors::{BridgeError, UploadError};
use crate::logger::{self, LogTag};
use crate::media;
use crate::webserver::{
    state::AppState,
    utils::{bridge_error_response, success_response},
};

/// Room for the non-file form fields and multipart framing
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

struct UploadForm {
    init_data: Option<String>,
    content_type: Option<String>,
    image: Option<Vec<u8>>,
}

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
}

/// POST /api/upload
async fn upload_image(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let result = async {
        let form = read_form(multipart).await?;
        let verified = state.verify(form.init_data.as_deref())?;
        let image = form
            .image
            .ok_or_else(|| UploadError::MissingField("image".to_string()))?;

        let stored =
            media::store_image(&state.config.media, form.content_type.as_deref(), &image).await?;
        logger::info(
            LogTag::Webserver,
            &format!("Image uploaded by user {}", verified.user_id),
        );
        Ok::<_, BridgeError>(stored.url)
    }
    .await;

    match result {
        Ok(url) => success_response(json!({ "url": url })),
        Err(e) => bridge_error_response(&e),
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, BridgeError> {
    let mut form = UploadForm {
        init_data: None,
        content_type: None,
        image: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.body_text()))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match name.as_str() {
            "initData" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?;
                form.init_data = Some(text);
            }
            "image" => {
                form.content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?;
                form.image = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use crate::treatments::fake::FakeStore;
    use crate::webserver::routes::test_support::{
        app_with_config, read_json, signed_init_data, test_config,
    };
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "nsbridge-test-boundary";

    fn multipart_body(init_data: &str, content_type: &str, image: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"initData\"\r\n\r\n{init}\r\n",
                b = BOUNDARY,
                init = init_data
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo\"\r\nContent-Type: {ct}\r\n\r\n",
                b = BOUNDARY,
                ct = content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(image);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_stores_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.media.root = dir.path().to_string_lossy().to_string();
        config.media.base_url = "https://media.example.com".to_string();
        let app = app_with_config(config, Arc::new(FakeStore::new()));

        let body = multipart_body(&signed_init_data(42), "image/jpeg", b"\xff\xd8\xff");
        let response = app.oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with("https://media.example.com/"));
        assert!(url.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.media.root = dir.path().to_string_lossy().to_string();
        config.media.max_upload_bytes = 8;
        let app = app_with_config(config, Arc::new(FakeStore::new()));

        let body = multipart_body(&signed_init_data(42), "image/gif", b"GIF8");
        let response = app.clone().oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = multipart_body(&signed_init_data(42), "image/png", &[0u8; 9]);
        let response = app.clone().oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = multipart_body(&signed_init_data(7), "image/png", b"\x89PNG");
        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
