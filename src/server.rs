//! HTTP surface: route registration, form-field parsing, and the
//! `/thumbnail` handler.
//!
//! Fields may arrive three ways, checked in this order: a
//! `multipart/form-data` body (required for file uploads), a urlencoded
//! body, or — when the body is empty — the query string, so plain GET
//! requests work. GET and POST are handled identically.

use crate::config::ServiceConfig;
use crate::error::{ApiError, ApiResult};
use crate::imaging;
use crate::imaging::exif::{MetadataOutcome, TagTable};
use crate::source::{self, UploadedFile};
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::StreamExt as _;
use serde::Serialize;
use tracing::{error, warn};

/// Register the service's routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/thumbnail")
            .route(web::get().to(thumbnail))
            .route(web::post().to(thumbnail)),
    )
    .route("/health", web::get().to(health));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Success response: inline thumbnail plus the source's EXIF tag table.
#[derive(Debug, Serialize)]
struct ThumbnailResponse {
    #[serde(rename = "thumbnailUrl")]
    thumbnail_url: String,
    metadata: TagTable,
}

/// Form fields recognized by the endpoint. Unknown fields are ignored.
#[derive(Debug, Default)]
struct FormFields {
    width: Option<String>,
    height: Option<String>,
    image_url: Option<String>,
    upload: Option<UploadedFile>,
}

/// The `/thumbnail` handler.
async fn thumbnail(
    req: HttpRequest,
    payload: web::Payload,
    config: web::Data<ServiceConfig>,
    http: web::Data<reqwest::Client>,
) -> ApiResult<HttpResponse> {
    let fields = read_fields(&req, payload).await?;

    let width = parse_dimension(fields.width.as_deref(), "width", config.default_edge)?;
    let height = parse_dimension(fields.height.as_deref(), "height", config.default_edge)?;

    let resolved = source::resolve(&config, &http, fields.image_url, fields.upload).await?;

    // Thumbnail pass: decode, shrink, JPEG-encode on the blocking pool
    let render_path = resolved.path.clone();
    let quality = config.jpeg_quality;
    let thumb = web::block(move || imaging::render_thumbnail(&render_path, (width, height), quality))
        .await
        .map_err(|e| {
            error!("thumbnail worker failed: {e}");
            ApiError::Internal
        })?
        .map_err(|e| {
            // Cause stays server-side; the client gets the generic message
            error!(path = %resolved.path.display(), "thumbnail generation failed: {e}");
            ApiError::ThumbnailFailed
        })?;

    // Metadata pass: independent decode of the same file, never fatal
    let meta_path = resolved.path.clone();
    let metadata = match web::block(move || imaging::exif::read_tag_table(&meta_path)).await {
        Ok(MetadataOutcome::Failed(e)) => {
            warn!(path = %resolved.path.display(), "metadata extraction failed: {e}");
            TagTable::new()
        }
        Ok(outcome) => outcome.into_tags(),
        Err(e) => {
            warn!("metadata worker failed: {e}");
            TagTable::new()
        }
    };

    let body = ThumbnailResponse {
        thumbnail_url: thumb.to_data_uri(),
        metadata,
    };

    // URL-sourced temp files are deleted here; uploads stay on disk
    drop(resolved);

    Ok(HttpResponse::Ok().json(body))
}

/// Parse an optional dimension field.
///
/// Absent or empty falls back to the default; a present but non-numeric or
/// non-positive value is a client error rather than a silent fallback.
fn parse_dimension(raw: Option<&str>, name: &str, default: u32) -> ApiResult<u32> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid {name} value: {value}"))),
    }
}

/// Extract form fields from whichever transport the request used.
async fn read_fields(req: &HttpRequest, mut payload: web::Payload) -> ApiResult<FormFields> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        return read_multipart(Multipart::new(req.headers(), payload)).await;
    }

    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|e| ApiError::BadRequest(format!("Malformed request body: {e}")))?;
        body.extend_from_slice(&chunk);
    }

    let raw: &[u8] = if body.is_empty() {
        req.query_string().as_bytes()
    } else {
        &body
    };

    let mut fields = FormFields::default();
    for (key, value) in url::form_urlencoded::parse(raw) {
        assign_text_field(&mut fields, &key, value.into_owned());
    }
    Ok(fields)
}

/// Drain a multipart stream into form fields, buffering the upload in memory.
async fn read_multipart(mut multipart: Multipart) -> ApiResult<FormFields> {
    let mut fields = FormFields::default();

    while let Some(item) = multipart.next().await {
        let mut field =
            item.map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?;

        let (name, filename) = {
            let Some(disposition) = field.content_disposition() else {
                continue;
            };
            let Some(name) = disposition.get_name().map(str::to_owned) else {
                continue;
            };
            (name, disposition.get_filename().map(str::to_owned))
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?;
            data.extend_from_slice(&chunk);
        }

        if name == "image" {
            fields.upload = Some(UploadedFile {
                filename: filename.unwrap_or_default(),
                data,
            });
        } else {
            assign_text_field(&mut fields, &name, String::from_utf8_lossy(&data).into_owned());
        }
    }

    Ok(fields)
}

fn assign_text_field(fields: &mut FormFields, name: &str, value: String) {
    match name {
        "width" => fields.width = Some(value),
        "height" => fields.height = Some(value),
        "imageUrl" => fields.image_url = Some(value),
        _ => {}
    }
}
