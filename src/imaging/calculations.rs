//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions of a scale-down to `max_width`.
///
/// Returns `None` when the source already fits (`width <= max_width`), meaning
/// no resize should happen at all. Otherwise the width becomes exactly
/// `max_width` and the height follows the source aspect ratio, rounded to the
/// nearest pixel and never below 1.
///
/// # Examples
/// ```
/// # use webp_ingest::imaging::scale_down_dimensions;
/// // 800x600 capped at 400 → 400x300
/// assert_eq!(scale_down_dimensions((800, 600), 400), Some((400, 300)));
///
/// // Already narrow enough → untouched
/// assert_eq!(scale_down_dimensions((300, 200), 400), None);
/// ```
pub fn scale_down_dimensions(source: (u32, u32), max_width: u32) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;

    if src_w <= max_width {
        return None;
    }

    // Integer round-half-up of src_h * max_width / src_w
    let scaled = (src_h as u64 * max_width as u64 + src_w as u64 / 2) / src_w as u64;
    Some((max_width, scaled.max(1) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_halved() {
        assert_eq!(scale_down_dimensions((800, 600), 400), Some((400, 300)));
    }

    #[test]
    fn portrait_scaled() {
        // 600x800 capped at 300 → 300x400
        assert_eq!(scale_down_dimensions((600, 800), 300), Some((300, 400)));
    }

    #[test]
    fn equal_width_is_identity() {
        assert_eq!(scale_down_dimensions((400, 300), 400), None);
    }

    #[test]
    fn narrower_source_is_never_upscaled() {
        assert_eq!(scale_down_dimensions((120, 90), 4000), None);
    }

    #[test]
    fn height_rounds_to_nearest() {
        // 1000x333 → 300 wide: 333 * 0.3 = 99.9 → 100
        assert_eq!(scale_down_dimensions((1000, 333), 300), Some((300, 100)));
        // 1000x335 → 300 wide: 100.5 → 101 (halves round up)
        assert_eq!(scale_down_dimensions((1000, 335), 300), Some((300, 101)));
    }

    #[test]
    fn extreme_panorama_keeps_one_pixel_height() {
        assert_eq!(scale_down_dimensions((10_000, 2), 100), Some((100, 1)));
    }
}
