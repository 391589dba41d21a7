//! Storage for images uploaded from the mini-app
//!
//! Files land in `<root>/<YYYY>/<MM>/<uuid><ext>` and are served by the
//! reverse proxy under the configured public base URL.

use crate::config::MediaConfig;
use crate::errors::{BridgeError, UploadError};
use crate::logger::{self, LogTag};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Accepted content types and the extension each is stored with
const ALLOWED_TYPES: [(&str, &str); 2] = [("image/jpeg", ".jpg"), ("image/png", ".png")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub url: String,
}

/// Extension for an accepted content type; parameters like `; charset` are ignored
pub fn extension_for(content_type: Option<&str>) -> Result<&'static str, UploadError> {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .map(|(_, ext)| *ext)
        .ok_or(UploadError::UnsupportedType(mime))
}

/// Validate and write an uploaded image
pub async fn store_image(
    config: &MediaConfig,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<StoredImage, BridgeError> {
    store_image_at(config, content_type, bytes, Utc::now()).await
}

pub(crate) async fn store_image_at(
    config: &MediaConfig,
    content_type: Option<&str>,
    bytes: &[u8],
    now: DateTime<Utc>,
) -> Result<StoredImage, BridgeError> {
    let extension = extension_for(content_type)?;
    if bytes.len() > config.max_upload_bytes {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            limit: config.max_upload_bytes,
        }
        .into());
    }
    if config.root.is_empty() {
        return Err(BridgeError::configuration("MEDIA_ROOT is not configured"));
    }

    let relative = format!(
        "{}/{}{}",
        now.format("%Y/%m"),
        Uuid::new_v4().simple(),
        extension
    );
    let path = Path::new(&config.root).join(&relative);
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&path, bytes).await?;

    let url = format!("{}/{}", config.base_url.trim_end_matches('/'), relative);
    logger::info(
        LogTag::Media,
        &format!("Stored upload {} ({} bytes)", relative, bytes.len()),
    );

    Ok(StoredImage { path, url })
}
