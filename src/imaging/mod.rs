//! Image work: decoding, bounded shrinking, JPEG encoding, EXIF reading.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate |
//! | Shrink to fit | Lanczos3, dimensions from the fit calculation |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | EXIF tag table | `kamadak-exif` |
//!
//! Split into:
//! - **calculations**: pure dimension math, testable without images
//! - [`thumbnail`]: decode → bounded shrink → in-memory JPEG → data URI
//! - [`exif`]: tag-table extraction with an explicit outcome type

mod calculations;
pub mod exif;
pub mod thumbnail;

use thiserror::Error;

pub use calculations::fit_within;
pub use thumbnail::{Thumbnail, render_thumbnail};

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("processing failed: {0}")]
    Processing(String),
}
