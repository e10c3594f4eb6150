//! Image processing: pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image::load_from_memory`, `DynamicImage::write_to` |
//! | **Two-stage scale** | `resize_exact` with `Nearest`, then `Triangle` (bilinear) |
//! | **Despeckle** | `imageproc` contours + 8-connected region labelling |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and area math (unit testable)
//! - **Parameters**: Scale requests, interpolation kernels, output formats
//! - **Binary**: The two-level [`BinaryImage`] raster
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod binary;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Component, ImageBackend};
pub use binary::{BACKGROUND, BinaryImage, FOREGROUND};
pub use calculations::{bin_factor, resolve_dimensions};
pub use operations::{DespeckleReport, despeckle, despeckle_report, get_dimensions, scale_image};
pub use params::{Interpolation, OutputFormat, ScaleRequest};
pub use rust_backend::RustBackend;
