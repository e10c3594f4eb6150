//! Project configuration module.
//!
//! Handles loading, validating, and merging the optional `config.toml` at the
//! project root. Stock defaults are overridden by whatever the file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [layout]
//! original_dir = "Original"             # Page scans as delivered
//! gray_dir = "PreProc/Gray"             # Grayscale pages
//! binary_dir = "PreProc/Binary"         # Binarized pages
//! despeckled_dir = "PreProc/Despeckled" # Despeckled binary pages
//! page_dir = "PageSegmentation"         # Per-page segment and line crops
//! image_ext = ".png"                    # Extension of page images
//! gray_ext = ".nrm.png"                 # Extension of gray segment/line crops
//! binary_ext = ".bin.png"               # Extension of binary segment/line crops
//!
//! [output]
//! format = "png"            # Format of scaled images: png | jpeg | tiff
//!
//! [despeckle]
//! max_area = 10.0           # Components enclosing less than this are removed
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [layout]
//! image_ext = ".tif"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Where page images and their crops live, relative to the project root.
    pub layout: LayoutConfig,
    /// Encoding of scaled images.
    pub output: OutputConfig,
    /// Despeckle stage settings.
    pub despeckle: DespeckleConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ProjectConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_area = self.despeckle.max_area;
        if max_area.is_nan() || max_area < 0.0 {
            return Err(ConfigError::Validation(
                "despeckle.max_area must be a non-negative number".into(),
            ));
        }
        let layout = &self.layout;
        for (key, ext) in [
            ("image_ext", &layout.image_ext),
            ("gray_ext", &layout.gray_ext),
            ("binary_ext", &layout.binary_ext),
        ] {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ConfigError::Validation(format!(
                    "layout.{key} must start with '.' (got {ext:?})"
                )));
            }
        }
        if layout.gray_ext == layout.binary_ext {
            return Err(ConfigError::Validation(
                "layout.gray_ext and layout.binary_ext must differ".into(),
            ));
        }
        for (key, dir) in [
            ("original_dir", &layout.original_dir),
            ("gray_dir", &layout.gray_dir),
            ("binary_dir", &layout.binary_dir),
            ("despeckled_dir", &layout.despeckled_dir),
            ("page_dir", &layout.page_dir),
        ] {
            if dir.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "layout.{key} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Directory names and file extensions of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub original_dir: String,
    pub gray_dir: String,
    pub binary_dir: String,
    pub despeckled_dir: String,
    /// Root of per-page segment and line crops.
    pub page_dir: String,
    /// Extension (with dot) of page images in every category.
    pub image_ext: String,
    pub gray_ext: String,
    pub binary_ext: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            original_dir: "Original".to_string(),
            gray_dir: "PreProc/Gray".to_string(),
            binary_dir: "PreProc/Binary".to_string(),
            despeckled_dir: "PreProc/Despeckled".to_string(),
            page_dir: "PageSegmentation".to_string(),
            image_ext: ".png".to_string(),
            gray_ext: ".nrm.png".to_string(),
            binary_ext: ".bin.png".to_string(),
        }
    }
}

/// Encoding of scaled images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Despeckle stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DespeckleConfig {
    /// Components whose enclosed area is strictly below this are removed.
    pub max_area: f64,
}

impl Default for DespeckleConfig {
    fn default() -> Self {
        Self { max_area: 10.0 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel despeckle workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ProjectConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ProjectConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ProjectConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given project directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# page-images configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to the project root.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Project layout
# ---------------------------------------------------------------------------
[layout]
# Page scans as delivered.
original_dir = "Original"
# Preprocessed page images.
gray_dir = "PreProc/Gray"
binary_dir = "PreProc/Binary"
despeckled_dir = "PreProc/Despeckled"
# Per-page directories holding segment crops, with one subdirectory per
# segment holding its line crops.
page_dir = "PageSegmentation"
# Extension of page images in every category above.
image_ext = ".png"
# Extensions of segment and line crops.
gray_ext = ".nrm.png"
binary_ext = ".bin.png"

# ---------------------------------------------------------------------------
# Scaled output
# ---------------------------------------------------------------------------
[output]
# Format scaled images are re-encoded into: "png", "jpeg" or "tiff".
# Unscaled requests always return the stored file untouched.
format = "png"

# ---------------------------------------------------------------------------
# Despeckling
# ---------------------------------------------------------------------------
[despeckle]
# Foreground blobs enclosing less than this many square pixels are erased.
# A page with a single blob is never touched.
max_area = 10.0

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel despeckle workers. Omit for auto (= number of CPU cores).
# Values above the core count are clamped down.
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = ProjectConfig::default();
        config.validate().unwrap();
        assert_eq!(config.layout.image_ext, ".png");
        assert_eq!(config.output.format, OutputFormat::Png);
        assert_eq!(config.despeckle.max_area, 10.0);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn load_config_partial_override() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[layout]\nimage_ext = \".tif\"\n\n[output]\nformat = \"jpeg\"\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.layout.image_ext, ".tif");
        assert_eq!(config.layout.gray_dir, "PreProc/Gray");
        assert_eq!(config.output.format, OutputFormat::Jpeg);
    }

    #[test]
    fn load_config_rejects_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[layout]\nimgext = \".png\"\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_rejects_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[layout\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn validate_rejects_negative_max_area() {
        let mut config = ProjectConfig::default();
        config.despeckle.max_area = -0.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_extension_without_dot() {
        let mut config = ProjectConfig::default();
        config.layout.binary_ext = "bin.png".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("layout.binary_ext"));
    }

    #[test]
    fn validate_rejects_identical_crop_extensions() {
        let mut config = ProjectConfig::default();
        config.layout.gray_ext = ".bin.png".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_dir() {
        let mut config = ProjectConfig::default();
        config.layout.page_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_toml_overlay_wins_and_base_preserved() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value(), Some(value)).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 100),
        };
        assert_eq!(effective_threads(&config), cores);
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }
}
