//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: decode, resample, encode, and find_components.
//!
//! The production implementation,
//! [`RustBackend`](super::rust_backend::RustBackend), uses the `image` crate
//! for codecs and resampling and `imageproc` for contour tracing.

use super::params::{Interpolation, OutputFormat};
use image::{DynamicImage, GrayImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// An external connected foreground region.
///
/// `boundary` is the traced outer border in pixel coordinates and `area` is
/// the polygon area it encloses (not the pixel count). `pixels` lists every
/// foreground pixel inside the border, including components nested in its
/// holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub boundary: Vec<(u32, u32)>,
    pub area: f64,
    pub pixels: Vec<(u32, u32)>,
}

/// Trait for image processing backends.
///
/// Every backend must implement all four operations so the rest of the
/// codebase is backend-agnostic. `Sync` lets one backend serve concurrent
/// requests and rayon workers.
pub trait ImageBackend: Sync {
    /// Decode raw file bytes into a raster.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resample to exactly `width` x `height` with the given kernel.
    fn resample(
        &self,
        img: &DynamicImage,
        width: u32,
        height: u32,
        interpolation: Interpolation,
    ) -> Result<DynamicImage, BackendError>;

    /// Encode a raster into the given format.
    fn encode(&self, img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, BackendError>;

    /// Find the external connected components of a mask where non-zero
    /// pixels are foreground.
    fn find_components(&self, mask: &GrayImage) -> Result<Vec<Component>, BackendError>;
}
