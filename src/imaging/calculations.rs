//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `original` inside `bounds`, preserving aspect ratio.
///
/// Images already inside the box are returned unchanged: derivatives are
/// never enlarged. Neither edge is ever rounded down to zero.
///
/// ```
/// # use phongsach_build::imaging::fit_inside;
/// assert_eq!(fit_inside((2400, 1600), (1200, 800)), (1200, 800));
/// assert_eq!(fit_inside((1000, 1000), (400, 225)), (225, 225));
/// assert_eq!(fit_inside((300, 200), (1200, 800)), (300, 200));
/// ```
pub fn fit_inside(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = original;
    let (max_w, max_h) = bounds;
    if w <= max_w && h <= max_h {
        return original;
    }

    let ratio = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let fit_w = ((w as f64 * ratio).round() as u32).clamp(1, max_w);
    let fit_h = ((h as f64 * ratio).round() as u32).clamp(1, max_h);
    (fit_w, fit_h)
}

/// Scale a bounding box by `factor`, rounding each edge and keeping it >= 1.
pub fn scale_bounds(bounds: (u32, u32), factor: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * factor as f64).round() as u32).max(1);
    (scale(bounds.0), scale(bounds.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_landscape_into_default_bounds() {
        // 3000x2000 (3:2) into 1200x800: width-limited, exact fit
        assert_eq!(fit_inside((3000, 2000), (1200, 800)), (1200, 800));
    }

    #[test]
    fn fit_wide_panorama_is_width_limited() {
        // 4000x1000 into 1200x800 → 1200x300
        assert_eq!(fit_inside((4000, 1000), (1200, 800)), (1200, 300));
    }

    #[test]
    fn fit_portrait_is_height_limited() {
        // 1000x2000 into 1200x800 → 400x800
        assert_eq!(fit_inside((1000, 2000), (1200, 800)), (400, 800));
    }

    #[test]
    fn fit_into_card_bounds() {
        // 1600x900 (16:9) into 400x225 → 400x225
        assert_eq!(fit_inside((1600, 900), (400, 225)), (400, 225));
        // 800x800 square into 400x225 → 225x225
        assert_eq!(fit_inside((800, 800), (400, 225)), (225, 225));
    }

    #[test]
    fn fit_never_enlarges() {
        assert_eq!(fit_inside((320, 240), (1200, 800)), (320, 240));
        assert_eq!(fit_inside((400, 225), (400, 225)), (400, 225));
    }

    #[test]
    fn fit_extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_inside((10000, 2), (100, 100)), (100, 1));
    }

    #[test]
    fn scale_bounds_small_variant() {
        assert_eq!(scale_bounds((1200, 800), 0.6), (720, 480));
        assert_eq!(scale_bounds((400, 225), 0.6), (240, 135));
    }

    #[test]
    fn scale_bounds_never_zero() {
        assert_eq!(scale_bounds((1, 1), 0.1), (1, 1));
    }
}
