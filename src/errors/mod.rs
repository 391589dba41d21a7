/// Structured error handling for the Nightscout bridge
///
/// `BridgeError` is the single error type crossing module boundaries. Input
/// and auth failures (`Validation`, `Signature`, `Upload`) are raised before
/// any remote call; store failures carry the endpoint, status and a short
/// body preview, never credentials.
use thiserror::Error;

pub mod store;
pub use store::{body_preview, StoreError};

// =============================================================================
// MAIN ERROR TYPE
// =============================================================================

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Treatment not found")]
    NotFound,

    #[error("Remote store error: {0}")]
    RemoteStore(#[from] StoreError),

    #[error("Reconciliation failed during {stage}: {source} (restore {restore})")]
    Reconciliation {
        stage: ReconcileStage,
        source: StoreError,
        restore: RestoreOutcome,
    },

    #[error("Signature rejected: {0}")]
    Signature(#[from] SignatureError),

    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn validation(message: impl Into<String>) -> Self {
        BridgeError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BridgeError::Configuration(message.into())
    }

    /// True for errors caused by the caller's input or credentials
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BridgeError::Validation(_)
                | BridgeError::NotFound
                | BridgeError::Signature(_)
                | BridgeError::Upload(_)
        )
    }
}

/// Network errors are reduced to their kind; their URL embeds the bot token
impl From<teloxide::RequestError> for BridgeError {
    fn from(err: teloxide::RequestError) -> Self {
        match err {
            teloxide::RequestError::Network(e) => {
                BridgeError::Telegram(format!("network error ({})", network_error_kind(&e)))
            }
            other => BridgeError::Telegram(other.to_string()),
        }
    }
}

fn network_error_kind(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timeout".to_string()
    } else if err.is_connect() {
        "connect".to_string()
    } else if let Some(status) = err.status() {
        format!("HTTP {}", status.as_u16())
    } else {
        "transport".to_string()
    }
}

// =============================================================================
// RECONCILIATION DETAILS
// =============================================================================

/// Step of the recreate sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    Delete,
    Recreate,
}

impl std::fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileStage::Delete => write!(f, "delete"),
            ReconcileStage::Recreate => write!(f, "recreate"),
        }
    }
}

/// What happened to the original document after a failed recreate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    NotAttempted,
    Restored,
    Failed(String),
}

impl std::fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreOutcome::NotAttempted => write!(f, "not attempted"),
            RestoreOutcome::Restored => write!(f, "succeeded"),
            RestoreOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

// =============================================================================
// SIGNATURE ERROR TYPES
// =============================================================================

/// Reasons a mini-app init data payload is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing init data")]
    MissingInitData,

    #[error("missing signature")]
    MissingHash,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("missing user info")]
    MissingUser,

    #[error("invalid user info")]
    InvalidUser,

    #[error("user is not allowed")]
    UserNotAllowed,
}

// =============================================================================
// UPLOAD ERROR TYPES
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("missing form field '{0}'")]
    MissingField(String),

    #[error("unsupported file type '{0}'")]
    UnsupportedType(String),

    #[error("file too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("malformed upload: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_display_keeps_original_error() {
        let err = BridgeError::Reconciliation {
            stage: ReconcileStage::Recreate,
            source: StoreError::from_status("POST /api/v1/treatments.json", 500, "boom"),
            restore: RestoreOutcome::Failed("HTTP 503".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("recreate"));
        assert!(text.contains("HTTP 500"));
        assert!(text.contains("restore failed: HTTP 503"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(BridgeError::validation("bad insulin").is_client_error());
        assert!(BridgeError::Signature(SignatureError::UserNotAllowed).is_client_error());
        assert!(!BridgeError::RemoteStore(StoreError::Timeout {
            endpoint: "GET /api/v1/treatments.json".to_string()
        })
        .is_client_error());
    }
}
