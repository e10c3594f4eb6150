//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::ScaleRequest;

/// Resolve a possibly-partial scale request against an image's intrinsic size.
///
/// - Neither dimension set: `None` (serve the original bytes).
/// - Both set: returned verbatim, even if that distorts the aspect ratio.
/// - One set: the other is derived from the intrinsic aspect ratio.
///
/// # Examples
/// ```
/// # use page_images::imaging::{ScaleRequest, resolve_dimensions};
/// let request = ScaleRequest::new(Some(300), None).unwrap();
/// assert_eq!(resolve_dimensions((1200, 800), &request), Some((300, 200)));
/// ```
pub fn resolve_dimensions(intrinsic: (u32, u32), request: &ScaleRequest) -> Option<(u32, u32)> {
    let (img_w, img_h) = intrinsic;

    match (request.width(), request.height()) {
        (None, None) => None,
        (Some(w), Some(h)) => Some((w, h)),
        (Some(w), None) => {
            let factor = img_w as f64 / w as f64;
            Some((w, derived_edge(img_h, factor)))
        }
        (None, Some(h)) => {
            let factor = img_h as f64 / h as f64;
            Some((derived_edge(img_w, factor), h))
        }
    }
}

fn derived_edge(edge: u32, factor: f64) -> u32 {
    ((edge as f64 / factor).round() as u32).max(1)
}

/// Uniform factor that fits `source` inside `target` on both axes.
pub fn scale_factor(source: (u32, u32), target: (u32, u32)) -> f64 {
    let sx = target.0 as f64 / source.0 as f64;
    let sy = target.1 as f64 / source.1 as f64;
    sx.min(sy)
}

/// Largest power of two that does not overshoot `factor`.
///
/// Reductions halve from 1 while the next half is still above `factor`;
/// enlargements double from 1 while the next double is still below it. The
/// coarse pass therefore never removes more resolution than the final size
/// needs.
pub fn bin_factor(factor: f64) -> f64 {
    let mut bin = 1.0;
    if factor <= 1.0 {
        while bin / 2.0 > factor {
            bin /= 2.0;
        }
    } else {
        while bin * 2.0 < factor {
            bin *= 2.0;
        }
    }
    bin
}

/// Multiply both edges by `factor`, truncating, never below one pixel.
pub fn binned_dimensions(source: (u32, u32), factor: f64) -> (u32, u32) {
    (
        ((source.0 as f64 * factor) as u32).max(1),
        ((source.1 as f64 * factor) as u32).max(1),
    )
}

/// Multiply both edges by `factor`, rounding, never below one pixel.
pub fn exact_dimensions(source: (u32, u32), factor: f64) -> (u32, u32) {
    (
        ((source.0 as f64 * factor).round() as u32).max(1),
        ((source.1 as f64 * factor).round() as u32).max(1),
    )
}

/// Area enclosed by a closed polygon (shoelace formula, absolute value).
///
/// Points are pixel coordinates along a traced boundary; the polygon is
/// implicitly closed. Fewer than three points enclose nothing.
pub fn polygon_area(points: &[(u32, u32)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, &(x0, y0)) in points.iter().enumerate() {
        let (x1, y1) = points[(i + 1) % points.len()];
        twice_area += x0 as f64 * y1 as f64 - x1 as f64 * y0 as f64;
    }
    (twice_area / 2.0).abs()
}
