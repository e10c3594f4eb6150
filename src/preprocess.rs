//! Batch despeckling of binarized pages.
//!
//! Reads every page in the binary directory, removes small noise components
//! and writes the result under the same file name in the despeckled
//! directory:
//!
//! ```text
//! PreProc/Binary/0001.png  ──despeckle──→  PreProc/Despeckled/0001.png
//! PreProc/Binary/0002.png  ──despeckle──→  PreProc/Despeckled/0002.png
//! ```
//!
//! Pages are thresholded at mid-gray on load, so 1-bit and 8-bit binaries
//! both work. Each page is independent; pages run in parallel on the global
//! [rayon](https://docs.rs/rayon) pool and report progress over an optional
//! channel as they finish.

use crate::imaging::{BackendError, BinaryImage, ImageBackend, OutputFormat, despeckle_report};
use crate::layout::{ImageCategory, ProjectLayout};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::info;

/// Luma above this is paper, at or below is ink.
const BINARIZE_LEVEL: u8 = 127;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed for {page}: {source}")]
    Imaging { page: String, source: BackendError },
    #[error("Binary page directory not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported page image extension: {0}")]
    UnsupportedExtension(String),
}

/// Result of despeckling one page, also sent as a progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DespeckleEvent {
    pub page_id: String,
    pub output: PathBuf,
    pub components: usize,
    pub removed: usize,
}

/// Despeckle every binary page of a project.
///
/// Returns one event per page, sorted by page id. Files whose name does not
/// end in the layout's page image extension are skipped.
pub fn despeckle_pages(
    backend: &impl ImageBackend,
    layout: &ProjectLayout,
    max_area: f64,
    events: Option<Sender<DespeckleEvent>>,
) -> Result<Vec<DespeckleEvent>, PreprocessError> {
    let format = OutputFormat::from_extension(layout.image_ext())
        .ok_or_else(|| PreprocessError::UnsupportedExtension(layout.image_ext().to_string()))?;

    let input_dir = layout.category_dir(ImageCategory::Binary);
    if !input_dir.is_dir() {
        return Err(PreprocessError::NotFound(input_dir));
    }
    let output_dir = layout.category_dir(ImageCategory::Despeckled);
    std::fs::create_dir_all(&output_dir)?;

    let mut pages: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(&input_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(page_id) = layout.page_id(&path) {
            pages.push((page_id, path));
        }
    }
    info!(pages = pages.len(), dir = %input_dir.display(), max_area, "despeckling");

    let mut results = pages
        .par_iter()
        .map(|(page_id, source)| {
            let output = layout.page_image(page_id, ImageCategory::Despeckled);
            let event = despeckle_page(backend, page_id, source, &output, max_area, format)?;
            if let Some(tx) = &events {
                tx.send(event.clone()).ok();
            }
            Ok(event)
        })
        .collect::<Result<Vec<_>, PreprocessError>>()?;

    results.sort_by(|a, b| a.page_id.cmp(&b.page_id));
    Ok(results)
}

fn despeckle_page(
    backend: &impl ImageBackend,
    page_id: &str,
    source: &Path,
    output: &Path,
    max_area: f64,
    format: OutputFormat,
) -> Result<DespeckleEvent, PreprocessError> {
    let imaging = |source: BackendError| PreprocessError::Imaging {
        page: page_id.to_string(),
        source,
    };

    let bytes = std::fs::read(source)?;
    let img = backend.decode(&bytes).map_err(imaging)?;
    let binary = BinaryImage::threshold(&img, BINARIZE_LEVEL);
    let report = despeckle_report(backend, &binary, max_area).map_err(imaging)?;
    let encoded = backend
        .encode(&report.image.into(), format)
        .map_err(imaging)?;
    std::fs::write(output, encoded)?;

    info!(page = page_id, components = report.components, removed = report.removed, "page despeckled");
    Ok(DespeckleEvent {
        page_id: page_id.to_string(),
        output: output.to_path_buf(),
        components: report.components,
        removed: report.removed,
    })
}
