//! Project directory layout: logical image identifiers → file paths.
//!
//! An OCR project keeps page scans and their derivatives in fixed places:
//!
//! ```text
//! project/
//! ├── config.toml                         # Optional, see [`crate::config`]
//! ├── Original/0001.png                   # ImageCategory::Original
//! ├── PreProc/
//! │   ├── Gray/0001.png                   # ImageCategory::Gray
//! │   ├── Binary/0001.png                 # ImageCategory::Binary
//! │   └── Despeckled/0001.png             # ImageCategory::Despeckled
//! └── PageSegmentation/
//!     └── 0001/
//!         ├── 0001__000__paragraph.bin.png        # segment, CropVariant::Binary
//!         ├── 0001__000__paragraph.nrm.png        # segment, CropVariant::Gray
//!         └── 0001__000__paragraph/
//!             └── 0001__000__paragraph__000.bin.png   # line
//! ```
//!
//! Directory names and extensions come from [`LayoutConfig`]. Categories are
//! closed enums: an unknown category name is an error, never a fallback.

use crate::config::LayoutConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Unknown image category '{0}' (expected Original, Gray, Despeckled or Binary)")]
    UnknownCategory(String),
    #[error("Unknown crop variant '{0}' (expected Gray or Binary)")]
    UnknownVariant(String),
}

/// Which page-level image to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ImageCategory {
    Original,
    Gray,
    Despeckled,
    Binary,
}

impl ImageCategory {
    pub const ALL: [ImageCategory; 4] = [
        ImageCategory::Original,
        ImageCategory::Gray,
        ImageCategory::Despeckled,
        ImageCategory::Binary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageCategory::Original => "Original",
            ImageCategory::Gray => "Gray",
            ImageCategory::Despeckled => "Despeckled",
            ImageCategory::Binary => "Binary",
        }
    }
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageCategory {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LayoutError::UnknownCategory(s.to_string()))
    }
}

/// Which rendition of a segment or line crop to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum CropVariant {
    Gray,
    Binary,
}

impl FromStr for CropVariant {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("gray") {
            Ok(CropVariant::Gray)
        } else if s.eq_ignore_ascii_case("binary") {
            Ok(CropVariant::Binary)
        } else {
            Err(LayoutError::UnknownVariant(s.to_string()))
        }
    }
}

/// Resolves page, segment and line identifiers to paths inside a project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    config: LayoutConfig,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, config: LayoutConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding page images of a category.
    pub fn category_dir(&self, category: ImageCategory) -> PathBuf {
        let dir = match category {
            ImageCategory::Original => &self.config.original_dir,
            ImageCategory::Gray => &self.config.gray_dir,
            ImageCategory::Despeckled => &self.config.despeckled_dir,
            ImageCategory::Binary => &self.config.binary_dir,
        };
        self.root.join(dir)
    }

    /// `<category dir>/<page_id><image_ext>`
    pub fn page_image(&self, page_id: &str, category: ImageCategory) -> PathBuf {
        self.category_dir(category)
            .join(format!("{page_id}{}", self.config.image_ext))
    }

    /// `<page_dir>/<page_id>/<segment_id><variant ext>`
    pub fn segment_image(&self, page_id: &str, segment_id: &str, variant: CropVariant) -> PathBuf {
        self.root
            .join(&self.config.page_dir)
            .join(page_id)
            .join(format!("{segment_id}{}", self.variant_ext(variant)))
    }

    /// `<page_dir>/<page_id>/<segment_id>/<line_id><variant ext>`
    pub fn line_image(
        &self,
        page_id: &str,
        segment_id: &str,
        line_id: &str,
        variant: CropVariant,
    ) -> PathBuf {
        self.root
            .join(&self.config.page_dir)
            .join(page_id)
            .join(segment_id)
            .join(format!("{line_id}{}", self.variant_ext(variant)))
    }

    /// Extension (with dot) shared by page images of every category.
    pub fn image_ext(&self) -> &str {
        &self.config.image_ext
    }

    /// Page id of a page image path, if its file name carries the page
    /// image extension.
    pub fn page_id(&self, path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        name.strip_suffix(self.config.image_ext.as_str())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    fn variant_ext(&self, variant: CropVariant) -> &str {
        match variant {
            CropVariant::Gray => &self.config.gray_ext,
            CropVariant::Binary => &self.config.binary_ext,
        }
    }
}
