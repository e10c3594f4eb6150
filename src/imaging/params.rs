//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the callers that decide what to serve (the
//! [`retrieve`](crate::retrieve) pipeline, the CLI) and the
//! [`backend`](super::backend) that does the pixel work.
//!
//! ## Types
//!
//! - [`ScaleRequest`]: Optional target width/height. Both absent means "serve the bytes as-is".
//! - [`Interpolation`]: Resampling kernel used by a single resize pass.
//! - [`OutputFormat`]: Raster format scaled images are re-encoded into.

use super::backend::BackendError;
use serde::{Deserialize, Serialize};

/// A possibly-partial scaling request.
///
/// Requests are plain values handed to each call, so concurrent callers can
/// ask for different sizes through the same [`Retriever`](crate::retrieve::Retriever).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleRequest {
    width: Option<u32>,
    height: Option<u32>,
}

impl ScaleRequest {
    /// Build a request, rejecting zero for either dimension.
    pub fn new(width: Option<u32>, height: Option<u32>) -> Result<Self, BackendError> {
        if width == Some(0) || height == Some(0) {
            return Err(BackendError::InvalidInput(format!(
                "target dimensions must be positive (width: {width:?}, height: {height:?})"
            )));
        }
        Ok(Self { width, height })
    }

    /// The "no scaling" request.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// True when neither dimension is set (fast path).
    pub fn is_none(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// Resampling kernel for a single resize pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    NearestNeighbor,
    Bilinear,
}

/// Raster format for re-encoded (scaled) images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Tiff,
}

impl OutputFormat {
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
            OutputFormat::Tiff => image::ImageFormat::Tiff,
        }
    }

    /// Format for a file extension such as `"png"` or `".bin.png"` (last
    /// component wins, case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let last = ext.rsplit('.').next()?.to_ascii_lowercase();
        match last.as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            _ => None,
        }
    }
}
