//! Thumbnail rendering: decode, bounded shrink, in-memory JPEG encode.
//!
//! The result stays in memory — the service returns thumbnails inline as
//! data URIs and never writes them to disk.

use super::{ImagingError, fit_within};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// A rendered thumbnail: JPEG bytes plus final dimensions.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Thumbnail {
    /// Wrap the JPEG bytes as a self-contained `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", BASE64.encode(&self.data))
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, ImagingError> {
    ImageReader::open(path)
        .map_err(ImagingError::Io)?
        .decode()
        .map_err(|e| {
            ImagingError::Processing(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode an image as JPEG into an in-memory buffer.
///
/// The image is flattened to RGB first; the JPEG encoder rejects alpha.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| ImagingError::Processing(format!("JPEG encode failed: {}", e)))?;
    Ok(buf.into_inner())
}

/// Render a thumbnail of the image at `path`, bounded by `bounds`.
///
/// Shrinks so neither dimension exceeds its bound while preserving aspect
/// ratio; images already within bounds are re-encoded at their original size.
pub fn render_thumbnail(
    path: &Path,
    bounds: (u32, u32),
    quality: u8,
) -> Result<Thumbnail, ImagingError> {
    let img = load_image(path)?;
    let source = (img.width(), img.height());
    let (out_w, out_h) = fit_within(source, bounds);

    let resized = if (out_w, out_h) == source {
        img
    } else {
        img.resize_exact(out_w, out_h, FilterType::Lanczos3)
    };

    let data = encode_jpeg(&resized, quality)?;
    debug!(
        source_width = source.0,
        source_height = source.1,
        width = out_w,
        height = out_h,
        bytes = data.len(),
        "thumbnail rendered"
    );

    Ok(Thumbnail {
        data,
        width: out_w,
        height: out_h,
    })
}
