//! Pure calculation functions for thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Bounding box for a thumbnail of the given width.
///
/// The box is always 4:3, whatever the source aspect ratio: the height is
/// `floor(width * 0.75)`.
///
/// ```
/// # use share_gallery::imaging::thumbnail_box;
/// assert_eq!(thumbnail_box(800), (800, 600));
/// assert_eq!(thumbnail_box(129), (129, 96));
/// ```
pub fn thumbnail_box(width: u32) -> (u32, u32) {
    (width, (u64::from(width) * 3 / 4) as u32)
}

/// Largest dimensions that fit inside `bounds` while keeping the aspect ratio
/// of `source`.
///
/// Images already inside the box are returned unchanged: thumbnails never
/// upscale. Each dimension is at least 1px.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bounds` - Bounding box (width, height)
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w == 0 || src_h == 0 || (src_w <= max_w && src_h <= max_h) {
        return source;
    }

    let scale = f64::min(
        max_w as f64 / src_w as f64,
        max_h as f64 / src_h as f64,
    );
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}
