//! Image retrieval as base64 payloads.
//!
//! ## Two Paths
//!
//! ```text
//! no scaling:  read bytes ─────────────────────────────────────────→ base64
//! scaling:     read bytes → decode → resolve size → scale → encode → base64
//! ```
//!
//! The fast path never decodes, so the front end receives the stored file
//! byte for byte, with no recompression loss. The scaled path re-encodes into
//! the configured [`OutputFormat`].
//!
//! ## Collaborators
//!
//! File access goes through [`ImageSource`] ([`FsSource`] in production) and
//! pixel work through an [`ImageBackend`], so the pipeline can be tested
//! with mocks. A [`Retriever`] holds no per-request state: the
//! [`ScaleRequest`] is an argument of every call.

use crate::imaging::{
    BackendError, ImageBackend, OutputFormat, ScaleRequest, get_dimensions, resolve_dimensions,
    scale_image,
};
use crate::layout::{CropVariant, ImageCategory, ProjectLayout};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image not found: {0}")]
    NotFound(PathBuf),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, RetrieveError>;

/// Raw file access.
pub trait ImageSource: Sync {
    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Regular files directly inside `dir`, in any order.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/// [`ImageSource`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ImageSource for FsSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Base64 text of raw bytes.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Identifier of an image file: its name without the last extension.
fn image_id(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// Serves images as base64, scaled on request.
pub struct Retriever<B, S = FsSource> {
    backend: B,
    source: S,
    format: OutputFormat,
}

impl<B: ImageBackend> Retriever<B, FsSource> {
    pub fn new(backend: B, format: OutputFormat) -> Self {
        Self::with_source(backend, FsSource, format)
    }
}

impl<B: ImageBackend, S: ImageSource> Retriever<B, S> {
    pub fn with_source(backend: B, source: S, format: OutputFormat) -> Self {
        Self {
            backend,
            source,
            format,
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.source.read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RetrieveError::NotFound(path.to_path_buf()),
            _ => RetrieveError::Io(e),
        })
    }

    /// The file at `path` as base64, scaled if `request` asks for it.
    pub fn retrieve(&self, path: &Path, request: &ScaleRequest) -> Result<String> {
        let bytes = self.read(path)?;
        if request.is_none() {
            debug!(path = %path.display(), bytes = bytes.len(), "serving original bytes");
            return Ok(encode_base64(&bytes));
        }

        let img = self.backend.decode(&bytes)?;
        let source = get_dimensions(&img);
        let img = match resolve_dimensions(source, request) {
            Some(target) => {
                debug!(path = %path.display(), ?source, ?target, "scaling");
                scale_image(&self.backend, &img, target)?
            }
            None => img,
        };
        let encoded = self.backend.encode(&img, self.format)?;
        Ok(encode_base64(&encoded))
    }

    /// Every file in `dir` as base64, keyed and ordered by file name
    /// without extension. Subdirectories are skipped.
    pub fn list(&self, dir: &Path) -> Result<BTreeMap<String, String>> {
        let files = self.source.list_files(dir).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RetrieveError::NotFound(dir.to_path_buf()),
            _ => RetrieveError::Io(e),
        })?;
        let mut images = BTreeMap::new();
        for path in files {
            let Some(id) = image_id(&path) else {
                continue;
            };
            images.insert(id, encode_base64(&self.read(&path)?));
        }
        debug!(dir = %dir.display(), count = images.len(), "listed images");
        Ok(images)
    }

    /// A page image of the given category.
    pub fn page_image(
        &self,
        layout: &ProjectLayout,
        page_id: &str,
        category: ImageCategory,
        request: &ScaleRequest,
    ) -> Result<String> {
        self.retrieve(&layout.page_image(page_id, category), request)
    }

    /// A segment crop of a page.
    pub fn segment_image(
        &self,
        layout: &ProjectLayout,
        page_id: &str,
        segment_id: &str,
        variant: CropVariant,
        request: &ScaleRequest,
    ) -> Result<String> {
        self.retrieve(&layout.segment_image(page_id, segment_id, variant), request)
    }

    /// A line crop of a segment.
    pub fn line_image(
        &self,
        layout: &ProjectLayout,
        page_id: &str,
        segment_id: &str,
        line_id: &str,
        variant: CropVariant,
        request: &ScaleRequest,
    ) -> Result<String> {
        self.retrieve(
            &layout.line_image(page_id, segment_id, line_id, variant),
            request,
        )
    }

    /// All page images of a category, keyed by page id.
    pub fn image_list(
        &self,
        layout: &ProjectLayout,
        category: ImageCategory,
    ) -> Result<BTreeMap<String, String>> {
        self.list(&layout.category_dir(category))
    }
}
