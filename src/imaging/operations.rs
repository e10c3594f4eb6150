//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they decide
//! which passes to run and at what sizes, and the backend does the pixels.

use super::backend::{BackendError, ImageBackend};
use super::binary::BinaryImage;
use super::calculations::{bin_factor, binned_dimensions, exact_dimensions, scale_factor};
use super::params::Interpolation;
use image::DynamicImage;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions as a `(width, height)` pair.
pub fn get_dimensions(img: &DynamicImage) -> (u32, u32) {
    (img.width(), img.height())
}

/// Scale an image towards `target` in two passes.
///
/// A nearest-neighbor pass by the largest power of two that does not
/// overshoot the required factor discards most of the excess resolution
/// cheaply; a bilinear pass then reaches the final size. Both passes scale
/// uniformly, so a distorted `target` is fitted, not stretched, and the
/// result may be a pixel off `target` on either axis.
pub fn scale_image(
    backend: &impl ImageBackend,
    img: &DynamicImage,
    target: (u32, u32),
) -> Result<DynamicImage> {
    let source = get_dimensions(img);
    if source.0 == 0 || source.1 == 0 {
        return Err(BackendError::InvalidInput(format!(
            "source image has no pixels ({}x{})",
            source.0, source.1
        )));
    }
    if target.0 == 0 || target.1 == 0 {
        return Err(BackendError::InvalidInput(format!(
            "target dimensions must be positive ({}x{})",
            target.0, target.1
        )));
    }

    let bin = bin_factor(scale_factor(source, target));
    let binned = if bin == 1.0 {
        None
    } else {
        let (w, h) = binned_dimensions(source, bin);
        debug!(bin, from = ?source, to = ?(w, h), "nearest-neighbor pass");
        Some(backend.resample(img, w, h, Interpolation::NearestNeighbor)?)
    };
    let intermediate = binned.as_ref().unwrap_or(img);

    let inter_dims = get_dimensions(intermediate);
    let (w, h) = exact_dimensions(inter_dims, scale_factor(inter_dims, target));
    debug!(from = ?inter_dims, to = ?(w, h), "bilinear pass");
    backend.resample(intermediate, w, h, Interpolation::Bilinear)
}

/// Outcome of a despeckle run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DespeckleReport {
    pub image: BinaryImage,
    /// External components found.
    pub components: usize,
    /// Components painted to background.
    pub removed: usize,
}

/// Remove foreground components smaller than `max_area`.
///
/// See [`despeckle_report`].
pub fn despeckle(
    backend: &impl ImageBackend,
    img: &BinaryImage,
    max_area: f64,
) -> Result<BinaryImage> {
    despeckle_report(backend, img, max_area).map(|report| report.image)
}

/// Remove foreground components whose enclosed area is below `max_area`
/// and report how many were found and removed.
///
/// Only external components count; holes and anything nested inside them
/// go with their enclosing component. An image with zero or one component
/// is returned unchanged whatever its size, so the only content on a page
/// is never erased. Components exactly at `max_area` are kept.
pub fn despeckle_report(
    backend: &impl ImageBackend,
    img: &BinaryImage,
    max_area: f64,
) -> Result<DespeckleReport> {
    if max_area.is_nan() || max_area < 0.0 {
        return Err(BackendError::InvalidInput(format!(
            "max_area must be a non-negative number, got {max_area}"
        )));
    }

    let components = backend.find_components(&img.inverted())?;
    let mut result = img.clone();
    let mut removed = 0;

    if components.len() > 1 {
        for component in components.iter().filter(|c| c.area < max_area) {
            result.erase(&component.pixels);
            removed += 1;
        }
    }

    debug!(
        components = components.len(),
        removed, max_area, "despeckled"
    );
    Ok(DespeckleReport {
        image: result,
        components: components.len(),
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::Component;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::binary::FOREGROUND;
    use crate::imaging::rust_backend::RustBackend;
    use image::{GrayImage, Luma};

    /// Binary page with ink inside each `(x, y, w, h)` rectangle.
    fn page_with_blobs(width: u32, height: u32, blobs: &[(u32, u32, u32, u32)]) -> BinaryImage {
        let gray = GrayImage::from_fn(width, height, |x, y| {
            let ink = blobs
                .iter()
                .any(|&(bx, by, bw, bh)| x >= bx && x < bx + bw && y >= by && y < by + bh);
            Luma([if ink { 0 } else { 255 }])
        });
        BinaryImage::new(gray).unwrap()
    }

    fn ink_count(img: &BinaryImage) -> usize {
        img.as_gray().pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    fn region_unchanged(a: &BinaryImage, b: &BinaryImage, (x, y, w, h): (u32, u32, u32, u32)) -> bool {
        (y..y + h).all(|yy| (x..x + w).all(|xx| a.is_foreground(xx, yy) == b.is_foreground(xx, yy)))
    }

    // =========================================================================
    // scale_image tests
    // =========================================================================

    #[test]
    fn scale_runs_nearest_then_bilinear() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_luma8(1200, 800);

        // factor 0.25 → bin 0.5, intermediate 600x400, bilinear to 300x200
        let out = scale_image(&backend, &img, (300, 200)).unwrap();
        assert_eq!(get_dimensions(&out), (300, 200));

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![
                RecordedOp::Resample {
                    from: (1200, 800),
                    to: (600, 400),
                    interpolation: Interpolation::NearestNeighbor,
                },
                RecordedOp::Resample {
                    from: (600, 400),
                    to: (300, 200),
                    interpolation: Interpolation::Bilinear,
                },
            ]
        );
    }

    #[test]
    fn scale_coarse_pass_stays_above_target() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_luma8(1000, 600);

        // factor 0.3 → bin 0.5 → 500x300, then 0.6 → 300x180
        let out = scale_image(&backend, &img, (300, 180)).unwrap();
        assert_eq!(get_dimensions(&out), (300, 180));

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Resample { to: (500, 300), interpolation: Interpolation::NearestNeighbor, .. }
        ));
        assert!(matches!(
            &ops[1],
            RecordedOp::Resample { from: (500, 300), to: (300, 180), interpolation: Interpolation::Bilinear }
        ));
    }

    #[test]
    fn scale_small_reduction_skips_coarse_pass() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_luma8(1000, 1000);

        // factor 0.8 → bin 1: only the bilinear pass
        scale_image(&backend, &img, (800, 800)).unwrap();
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resample { to: (800, 800), interpolation: Interpolation::Bilinear, .. }
        ));
    }

    #[test]
    fn scale_distorted_target_is_fitted() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_luma8(800, 400);

        // Square target: width is the tighter axis → 100x50
        let out = scale_image(&backend, &img, (100, 100)).unwrap();
        assert_eq!(get_dimensions(&out), (100, 50));
    }

    #[test]
    fn scale_enlargement_doubles_first() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_luma8(100, 50);

        // factor 5 → bin 4 → 400x200, then 1.25 → 500x250
        let out = scale_image(&backend, &img, (500, 250)).unwrap();
        assert_eq!(get_dimensions(&out), (500, 250));
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Resample { to: (400, 200), interpolation: Interpolation::NearestNeighbor, .. }
        ));
    }

    #[test]
    fn scale_rejects_empty_source() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_luma8(0, 10);
        let result = scale_image(&backend, &img, (5, 5));
        assert!(matches!(result, Err(BackendError::InvalidInput(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn scale_rejects_zero_target() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_luma8(10, 10);
        assert!(scale_image(&backend, &img, (0, 5)).is_err());
    }

    #[test]
    fn scale_with_real_backend_within_one_pixel() {
        let backend = RustBackend::new();
        let img = DynamicImage::new_rgb8(1237, 911);
        let out = scale_image(&backend, &img, (200, 147)).unwrap();
        let (w, h) = get_dimensions(&out);
        assert!(w.abs_diff(200) <= 1, "width {w}");
        assert!(h.abs_diff(147) <= 1, "height {h}");
    }

    // =========================================================================
    // despeckle tests
    // =========================================================================

    #[test]
    fn despeckle_removes_small_blob_keeps_large() {
        // 6x9 blob → area 40; 51x101 blob → area 5000
        let small = (100, 100, 6, 9);
        let large = (400, 200, 51, 101);
        let page = page_with_blobs(1000, 500, &[small, large]);

        let report = despeckle_report(&RustBackend::new(), &page, 100.0).unwrap();
        assert_eq!(report.components, 2);
        assert_eq!(report.removed, 1);
        assert!(!report.image.is_foreground(102, 104));
        assert!(region_unchanged(&page, &report.image, large));
        assert_eq!(ink_count(&report.image), 51 * 101);
    }

    #[test]
    fn despeckle_removes_corner_speck() {
        let word = (40, 40, 30, 30);
        let page = page_with_blobs(100, 100, &[(0, 0, 3, 3), word]);
        let report = despeckle_report(&RustBackend::new(), &page, 100.0).unwrap();
        assert_eq!((report.components, report.removed), (2, 1));
        assert!(!report.image.is_foreground(0, 0));
        assert!(region_unchanged(&page, &report.image, word));
    }

    #[test]
    fn despeckle_removes_edge_speck() {
        let page = page_with_blobs(100, 100, &[(0, 50, 2, 2), (40, 10, 30, 30)]);
        let report = despeckle_report(&RustBackend::new(), &page, 100.0).unwrap();
        assert_eq!((report.components, report.removed), (2, 1));
        assert!(!report.image.is_foreground(0, 51));
        assert_eq!(ink_count(&report.image), 900);
    }

    #[test]
    fn despeckle_keeps_large_component_along_edge() {
        let band = (0, 0, 100, 10);
        let page = page_with_blobs(100, 100, &[(97, 97, 3, 3), band]);
        let report = despeckle_report(&RustBackend::new(), &page, 100.0).unwrap();
        assert_eq!((report.components, report.removed), (2, 1));
        assert!(!report.image.is_foreground(99, 99));
        assert!(region_unchanged(&page, &report.image, band));
    }

    #[test]
    fn despeckle_tiny_images_are_noop() {
        for (w, h) in [(1, 1), (1, 6), (6, 1)] {
            let page = page_with_blobs(w, h, &[(0, 0, w, h)]);
            let report = despeckle_report(&RustBackend::new(), &page, 100.0).unwrap();
            assert_eq!(report.components, 1);
            assert_eq!(report.image, page);
        }
    }

    #[test]
    fn despeckle_single_component_is_noop() {
        let page = page_with_blobs(50, 50, &[(10, 10, 3, 3)]);
        let out = despeckle(&RustBackend::new(), &page, 1_000_000.0).unwrap();
        assert_eq!(out, page);
    }

    #[test]
    fn despeckle_blank_page_is_noop() {
        let page = BinaryImage::blank(40, 30);
        let report = despeckle_report(&RustBackend::new(), &page, 50.0).unwrap();
        assert_eq!(report.components, 0);
        assert_eq!(report.image, page);
    }

    #[test]
    fn despeckle_keeps_component_at_threshold() {
        // both blobs enclose exactly 40
        let page = page_with_blobs(100, 100, &[(10, 10, 6, 9), (50, 50, 6, 9)]);
        let out = despeckle(&RustBackend::new(), &page, 40.0).unwrap();
        assert_eq!(out, page);
    }

    #[test]
    fn despeckle_can_remove_every_component() {
        let page = page_with_blobs(100, 100, &[(10, 10, 2, 2), (50, 50, 3, 3)]);
        let out = despeckle(&RustBackend::new(), &page, 100.0).unwrap();
        assert_eq!(ink_count(&out), 0);
    }

    #[test]
    fn despeckle_erases_content_nested_in_removed_component() {
        // Small frame with a dot in its hole, plus a large blob elsewhere
        let mut gray = page_with_blobs(120, 120, &[(10, 10, 7, 7), (60, 60, 40, 40)]).into_gray();
        for y in 11..16 {
            for x in 11..16 {
                gray.put_pixel(x, y, Luma([255]));
            }
        }
        gray.put_pixel(13, 13, Luma([0]));
        let page = BinaryImage::new(gray).unwrap();

        let report = despeckle_report(&RustBackend::new(), &page, 100.0).unwrap();
        assert_eq!(report.components, 2);
        assert!(!report.image.is_foreground(13, 13));
        assert!(!report.image.is_foreground(10, 10));
        assert_eq!(ink_count(&report.image), 1600);
    }

    #[test]
    fn despeckle_output_stays_binary_and_same_size() {
        let page = page_with_blobs(64, 48, &[(1, 1, 2, 2), (20, 20, 20, 20)]);
        let out = despeckle(&RustBackend::new(), &page, 10.0).unwrap();
        assert_eq!((out.width(), out.height()), (64, 48));
        assert!(BinaryImage::new(out.into_gray()).is_ok());
    }

    #[test]
    fn despeckle_rejects_negative_area() {
        let page = BinaryImage::blank(4, 4);
        assert!(despeckle(&MockBackend::new(), &page, -1.0).is_err());
        assert!(despeckle(&MockBackend::new(), &page, f64::NAN).is_err());
    }

    #[test]
    fn despeckle_uses_component_pixels_from_backend() {
        let page = page_with_blobs(10, 10, &[(0, 0, 1, 1), (5, 5, 1, 1)]);
        let backend = MockBackend::with_components(vec![
            Component {
                boundary: vec![(0, 0)],
                area: 0.0,
                pixels: vec![(0, 0)],
            },
            Component {
                boundary: vec![(5, 5)],
                area: 500.0,
                pixels: vec![(5, 5)],
            },
        ]);

        let out = despeckle(&backend, &page, 1.0).unwrap();
        assert!(!out.is_foreground(0, 0));
        assert!(out.is_foreground(5, 5));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::FindComponents((10, 10))]
        );
    }
}
