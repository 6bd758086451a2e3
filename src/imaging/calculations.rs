//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions that fit a source image inside a bounding box.
///
/// Shrink-only: a source already within the bounds is returned unchanged
/// (thumbnails never enlarge). Otherwise both dimensions are scaled by the
/// same factor so the result preserves the source aspect ratio and neither
/// dimension exceeds its bound. Dimensions never round down to zero.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bounds` - Maximum allowed dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Output dimensions, each `<=` its bound
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return (src_w, src_h);
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = (src_w as f64 * scale).round() as u32;
    let h = (src_h as f64 * scale).round() as u32;

    // Rounding must not break the bounds or produce a degenerate dimension
    (w.clamp(1, max_w), h.clamp(1, max_h))
}
