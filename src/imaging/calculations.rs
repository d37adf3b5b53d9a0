//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the size of an image shrunk to fit inside a bounding box.
///
/// The aspect ratio is preserved and images are never enlarged: a source
/// that already fits is returned unchanged. Each side is at least one pixel
/// and never exceeds its bound.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bounds` - Maximum allowed dimensions (width, height)
///
/// # Examples
/// ```
/// # use pythonz::imaging::calculate_fit_dimensions;
/// // 800x600 into a 200x200 box → 200x150
/// assert_eq!(calculate_fit_dimensions((800, 600), (200, 200)), (200, 150));
///
/// // Small images are left alone
/// assert_eq!(calculate_fit_dimensions((64, 48), (200, 200)), (64, 48));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = f64::min(max_w as f64 / src_w as f64, max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}
