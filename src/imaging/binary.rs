//! Two-level rasters for binarized page scans.
//!
//! Ink is dark: [`FOREGROUND`] is 0 and [`BACKGROUND`] is 255, matching how
//! binarization tools write their `.bin.png` output.

use super::backend::BackendError;
use image::{DynamicImage, GrayImage, Luma};

pub const FOREGROUND: u8 = 0;
pub const BACKGROUND: u8 = 255;

/// A grayscale raster restricted to [`FOREGROUND`] and [`BACKGROUND`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage(GrayImage);

impl BinaryImage {
    /// Wrap a grayscale image, rejecting any pixel that is not 0 or 255.
    pub fn new(gray: GrayImage) -> Result<Self, BackendError> {
        if let Some((x, y, px)) = gray
            .enumerate_pixels()
            .find(|(_, _, p)| p[0] != FOREGROUND && p[0] != BACKGROUND)
        {
            return Err(BackendError::InvalidInput(format!(
                "not a binary image: pixel ({x}, {y}) has level {}",
                px[0]
            )));
        }
        Ok(Self(gray))
    }

    /// Binarize any raster: luma above `level` becomes background, the rest ink.
    pub fn threshold(img: &DynamicImage, level: u8) -> Self {
        let mut gray = img.to_luma8();
        for px in gray.pixels_mut() {
            px[0] = if px[0] > level { BACKGROUND } else { FOREGROUND };
        }
        Self(gray)
    }

    /// A blank (all background) image.
    pub fn blank(width: u32, height: u32) -> Self {
        Self(GrayImage::from_pixel(width, height, Luma([BACKGROUND])))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] == FOREGROUND
    }

    /// Copy with ink as 255 and paper as 0, the polarity contour tracing expects.
    pub fn inverted(&self) -> GrayImage {
        let mut inverted = self.0.clone();
        image::imageops::invert(&mut inverted);
        inverted
    }

    /// Paint the given pixels to background.
    pub(crate) fn erase(&mut self, pixels: &[(u32, u32)]) {
        for &(x, y) in pixels {
            self.0.put_pixel(x, y, Luma([BACKGROUND]));
        }
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}

impl From<BinaryImage> for DynamicImage {
    fn from(img: BinaryImage) -> Self {
        DynamicImage::ImageLuma8(img.0)
    }
}
