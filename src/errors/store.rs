/// Errors reported by the remote treatment store
use thiserror::Error;

/// Maximum characters of a response body kept for diagnostics
pub const BODY_PREVIEW_CHARS: usize = 200;

pub const HTTP_NOT_FOUND: u16 = 404;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Non-2xx response
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// 2xx response whose body could not be understood
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl StoreError {
    /// Build a status error, truncating the body to a preview
    pub fn from_status(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        StoreError::Status {
            endpoint: endpoint.into(),
            status,
            body: body_preview(body),
        }
    }

    /// Map a transport-level reqwest failure, dropping the URL (it may carry a token)
    pub fn from_reqwest(endpoint: impl Into<String>, err: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if err.is_timeout() {
            return StoreError::Timeout { endpoint };
        }
        StoreError::Transport {
            endpoint,
            message: err.without_url().to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(HTTP_NOT_FOUND)
    }
}

/// Trimmed, length-limited copy of a response body
pub fn body_preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    if trimmed.chars().count() <= BODY_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut preview: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
    preview.push('…');
    preview
}
