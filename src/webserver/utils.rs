/// Response helpers shared by the API routes
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::errors::{BridgeError, UploadError};
use crate::logger::{self, LogTag};

/// JSON success body with status 200
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// `{"detail": message}` with the given status
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// HTTP status for a bridge error
pub fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
        BridgeError::NotFound => StatusCode::NOT_FOUND,
        BridgeError::Signature(_) => StatusCode::FORBIDDEN,
        BridgeError::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        BridgeError::Upload(_) => StatusCode::BAD_REQUEST,
        BridgeError::RemoteStore(_) | BridgeError::Reconciliation { .. } => {
            StatusCode::BAD_GATEWAY
        }
        BridgeError::Configuration(_) | BridgeError::Telegram(_) | BridgeError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Map a bridge error to a response
///
/// Client errors carry their message; upstream and internal failures are
/// logged in full and answered with a generic text.
pub fn bridge_error_response(err: &BridgeError) -> Response {
    let status = status_for(err);
    if err.is_client_error() {
        logger::debug(
            LogTag::Webserver,
            &format!("Rejected request ({}): {}", status.as_u16(), err),
        );
        return error_response(status, &client_message(err));
    }

    logger::error(LogTag::Webserver, &format!("Request failed: {}", err));
    let message = if status == StatusCode::BAD_GATEWAY {
        "Nightscout request failed"
    } else {
        "Internal server error"
    };
    error_response(status, message)
}

fn client_message(err: &BridgeError) -> String {
    match err {
        BridgeError::Validation(message) => message.clone(),
        BridgeError::NotFound => "Treatment not found".to_string(),
        BridgeError::Signature(reason) => capitalize(&reason.to_string()),
        BridgeError::Upload(UploadError::TooLarge { .. }) => "File too large".to_string(),
        BridgeError::Upload(UploadError::UnsupportedType(_)) => {
            "Unsupported file type".to_string()
        }
        BridgeError::Upload(reason) => capitalize(&reason.to_string()),
        other => other.to_string(),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
