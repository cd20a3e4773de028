//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the size of a thumbnail that fits a `max × max` bounding box.
///
/// The source aspect ratio is preserved and the longer edge becomes exactly
/// `max`. Sources that already fit are returned unchanged (no upscaling).
/// The shorter edge is rounded and never drops below one pixel.
///
/// # Examples
/// ```
/// # use thumbwell::imaging::calculate_fit_dimensions;
/// // 4000x3000 landscape into a 300 box → 300x225
/// assert_eq!(calculate_fit_dimensions((4000, 3000), 300), (300, 225));
///
/// // Already small enough → untouched
/// assert_eq!(calculate_fit_dimensions((120, 80), 300), (120, 80));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), max: u32) -> (u32, u32) {
    let (src_w, src_h) = source;

    if max == 0 || src_w == 0 || src_h == 0 || (src_w <= max && src_h <= max) {
        return source;
    }

    let scale_short = |short: u32, long: u32| -> u32 {
        ((short as f64 * max as f64 / long as f64).round() as u32).clamp(1, max)
    };

    if src_w >= src_h {
        // Landscape or square: width hits the box
        (max, scale_short(src_h, src_w))
    } else {
        // Portrait: height hits the box
        (scale_short(src_w, src_h), max)
    }
}
