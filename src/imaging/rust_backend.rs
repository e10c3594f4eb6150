//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, TIFF) | `image::load_from_memory` |
//! | Resample | `DynamicImage::resize_exact` with `Nearest` or `Triangle` (bilinear) |
//! | Encode | `DynamicImage::write_to` into an in-memory buffer |
//! | Contours | `imageproc::contours::find_contours` (Suzuki–Abe border following) |
//! | Component pixels | `imageproc::region_labelling::connected_components` (8-connected) |

use super::backend::{BackendError, Component, ImageBackend};
use super::calculations::polygon_area;
use super::params::{Interpolation, OutputFormat};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::HashMap;
use std::io::Cursor;

/// Pure Rust backend using the `image` and `imageproc` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_for(interpolation: Interpolation) -> FilterType {
    match interpolation {
        Interpolation::NearestNeighbor => FilterType::Nearest,
        Interpolation::Bilinear => FilterType::Triangle,
    }
}

/// Follow parent links up to the outermost border.
fn root_contour(contours: &[Contour<u32>], mut index: usize) -> usize {
    while let Some(parent) = contours[index].parent {
        index = parent;
    }
    index
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resample(
        &self,
        img: &DynamicImage,
        width: u32,
        height: u32,
        interpolation: Interpolation,
    ) -> Result<DynamicImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidInput(format!(
                "cannot resample to {width}x{height}"
            )));
        }
        Ok(img.resize_exact(width, height, filter_for(interpolation)))
    }

    fn encode(&self, img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        // JPEG has no alpha channel
        let flattened;
        let img = if format == OutputFormat::Jpeg && img.color().has_alpha() {
            flattened = DynamicImage::ImageRgb8(img.to_rgb8());
            &flattened
        } else {
            img
        };
        img.write_to(&mut Cursor::new(&mut buf), format.image_format())
            .map_err(|e| BackendError::Encode(format!("{format:?}: {e}")))?;
        Ok(buf)
    }

    fn find_components(&self, mask: &GrayImage) -> Result<Vec<Component>, BackendError> {
        // Contour tracing misreads borders that touch the image edge, so trace
        // on a copy framed by one pixel of background.
        let padded = GrayImage::from_fn(mask.width() + 2, mask.height() + 2, |x, y| {
            let inside = x >= 1 && y >= 1 && x <= mask.width() && y <= mask.height();
            let ink = inside && mask.get_pixel(x - 1, y - 1)[0] > 0;
            Luma([if ink { 255 } else { 0 }])
        });
        let unpad = |x: u32, y: u32| (x - 1, y - 1);

        let contours: Vec<Contour<u32>> = find_contours(&padded);
        let externals: Vec<usize> = contours
            .iter()
            .enumerate()
            .filter(|(_, c)| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|(i, _)| i)
            .collect();
        let position: HashMap<usize, usize> = externals
            .iter()
            .enumerate()
            .map(|(pos, &i)| (i, pos))
            .collect();

        // Every outer border, nested or not, belongs to its outermost ancestor.
        let labels = connected_components(&padded, Connectivity::Eight, Luma([0u8]));
        let mut owner: HashMap<u32, usize> = HashMap::new();
        for (i, contour) in contours.iter().enumerate() {
            if contour.border_type != BorderType::Outer {
                continue;
            }
            let Some(first) = contour.points.first() else {
                continue;
            };
            let label = labels.get_pixel(first.x, first.y)[0];
            if let Some(&pos) = position.get(&root_contour(&contours, i)) {
                owner.insert(label, pos);
            }
        }

        let mut pixels: Vec<Vec<(u32, u32)>> = vec![Vec::new(); externals.len()];
        for (x, y, label) in labels.enumerate_pixels() {
            if let Some(&pos) = owner.get(&label[0]) {
                pixels[pos].push(unpad(x, y));
            }
        }

        Ok(externals
            .iter()
            .zip(pixels)
            .map(|(&i, pixels)| {
                let boundary: Vec<(u32, u32)> =
                    contours[i].points.iter().map(|p| unpad(p.x, p.y)).collect();
                Component {
                    area: polygon_area(&boundary),
                    boundary,
                    pixels,
                }
            })
            .collect())
    }
}
