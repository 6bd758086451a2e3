//! Image-source resolution.
//!
//! Every request carries exactly one usable source: a remote URL or an
//! uploaded file. Both are materialized as a file in the uploads directory
//! before any image work happens — the thumbnail and metadata passes each
//! re-open that file independently.
//!
//! Lifecycle differs by source:
//! - **URL**: the downloaded image is decoded, persisted under a key derived
//!   from the URL basename, and removed again when the request finishes
//!   (drop guard; deletion failures are logged and swallowed).
//! - **Upload**: raw bytes are persisted under a key derived from the
//!   sanitized client filename and left in place after the response.

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::imaging::ImagingError;
use crate::naming;
use actix_web::web;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use url::Url;

/// A file uploaded through the `image` form field.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, untrusted and possibly empty.
    pub filename: String,
    pub data: Vec<u8>,
}

/// Deletes the wrapped file when dropped.
///
/// Deletion failure is logged at WARN and never surfaces to the client.
#[derive(Debug)]
pub struct TempFileGuard {
    path: PathBuf,
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "failed to delete temporary file: {e}");
        }
    }
}

/// A source materialized as a local file, plus its cleanup policy.
#[derive(Debug)]
pub struct ResolvedSource {
    pub path: PathBuf,
    guard: Option<TempFileGuard>,
}

impl ResolvedSource {
    fn temporary(path: PathBuf) -> Self {
        let guard = TempFileGuard { path: path.clone() };
        Self {
            path,
            guard: Some(guard),
        }
    }

    fn persistent(path: PathBuf) -> Self {
        Self { path, guard: None }
    }

    /// Whether the file will be removed when this source is dropped.
    pub fn is_temporary(&self) -> bool {
        self.guard.is_some()
    }
}

/// Resolve the request's image source to a local file.
///
/// `imageUrl` wins when both fields are present, matching the endpoint
/// contract. Returns 400 errors for missing sources, empty upload
/// filenames, and any failure along the URL fetch/decode/persist path.
pub async fn resolve(
    config: &ServiceConfig,
    client: &reqwest::Client,
    image_url: Option<String>,
    upload: Option<UploadedFile>,
) -> Result<ResolvedSource, ApiError> {
    if let Some(url) = image_url {
        return fetch_remote(config, client, &url).await;
    }

    let Some(file) = upload else {
        return Err(ApiError::BadRequest(
            "Missing imageUrl or image file".to_string(),
        ));
    };
    if file.filename.is_empty() {
        return Err(ApiError::BadRequest("No selected file".to_string()));
    }

    let uploads_dir = config.uploads_dir.clone();
    let path = web::block(move || persist_upload(&uploads_dir, &file))
        .await
        .map_err(|e| {
            error!("upload worker failed: {e}");
            ApiError::Internal
        })?
        .map_err(|e| {
            error!("failed to persist upload: {e}");
            ApiError::Internal
        })?;

    Ok(ResolvedSource::persistent(path))
}

/// Download, decode, and persist a remote image as a temp file.
///
/// Single-shot fetch, no retry, no timeout. Any failure — unparseable URL,
/// network error, HTTP error status, non-image payload, write failure —
/// reports as 400 with the cause, mirroring the endpoint contract.
async fn fetch_remote(
    config: &ServiceConfig,
    client: &reqwest::Client,
    raw_url: &str,
) -> Result<ResolvedSource, ApiError> {
    let url = Url::parse(raw_url).map_err(|e| fetch_error(&e))?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_error(&e))?;
    let body = response.bytes().await.map_err(|e| fetch_error(&e))?;

    let base_name = naming::url_base_name(&url);
    let uploads_dir = config.uploads_dir.clone();
    let path = web::block(move || persist_remote(&uploads_dir, &base_name, &body))
        .await
        .map_err(|e| {
            error!("fetch worker failed: {e}");
            ApiError::Internal
        })?
        .map_err(|e| fetch_error(&e))?;

    Ok(ResolvedSource::temporary(path))
}

fn fetch_error(cause: &dyn std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Error downloading image from URL: {cause}"))
}

/// Write uploaded bytes to the uploads directory under a content-hashed key.
fn persist_upload(uploads_dir: &Path, file: &UploadedFile) -> std::io::Result<PathBuf> {
    let sanitized = naming::sanitize_file_name(&file.filename);
    let path = uploads_dir.join(naming::storage_key(&sanitized, &file.data));
    std::fs::write(&path, &file.data)?;
    Ok(path)
}

/// Formats a fetched image may be persisted in, keyed by the URL basename's
/// extension. Anything else is rewritten to JPEG.
const PERSIST_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Decode a downloaded payload and persist it under a content-hashed key.
///
/// The persisted file is a re-encode of the decoded image, not the raw
/// download; the format follows the URL basename's extension when supported.
fn persist_remote(
    uploads_dir: &Path,
    base_name: &str,
    body: &[u8],
) -> Result<PathBuf, ImagingError> {
    let img = image::load_from_memory(body)
        .map_err(|e| ImagingError::Processing(format!("not a decodable image: {e}")))?;

    let (file_name, format) = persist_target(base_name, body);
    let path = uploads_dir.join(file_name);

    let result = match format {
        // The JPEG encoder rejects alpha; flatten first
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).save_with_format(&path, format),
        _ => img.save_with_format(&path, format),
    };
    result.map_err(|e| ImagingError::Processing(format!("failed to persist image: {e}")))?;

    Ok(path)
}

/// Choose the storage file name and encode format for a fetched image.
fn persist_target(base_name: &str, content: &[u8]) -> (String, ImageFormat) {
    let format = base_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .and_then(|ext| {
            PERSIST_CANDIDATES
                .iter()
                .find(|(candidate, _)| *candidate == ext)
                .map(|(_, format)| *format)
        });

    match format {
        Some(format) => (naming::storage_key(base_name, content), format),
        None => {
            let stem = base_name
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(base_name);
            (
                naming::storage_key(&format!("{stem}.jpg"), content),
                ImageFormat::Jpeg,
            )
        }
    }
}
