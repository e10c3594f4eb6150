//! # Page Images
//!
//! Serves the page, segment and line images of an OCR project to a web front
//! end as base64 payloads, optionally rescaled, and despeckles binarized
//! page scans.
//!
//! # Architecture
//!
//! ```text
//! identifier ──layout──→ path ──retrieve──→ bytes ─┬──────────────────────────→ base64
//!                                                  └→ decode → scale → encode ─→ base64
//!
//! PreProc/Binary/*.png ──preprocess (despeckle)──→ PreProc/Despeckled/*.png
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | Image categories and identifier → path resolution |
//! | [`retrieve`] | Base64 retrieval with byte-passthrough fast path and bulk listing |
//! | [`imaging`] | Dimension math, two-stage scaling, despeckle filter, backend trait |
//! | [`preprocess`] | Batch despeckling of a project's binary pages |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two-Stage Scaling
//!
//! Page scans are large and previews small. A single bilinear resize from
//! 5000px to 300px is slow; a single nearest-neighbor resize aliases badly.
//! [`imaging::scale_image`] first takes a nearest-neighbor step by the largest
//! power of two that stays above the target, then finishes with bilinear
//! interpolation on the much smaller intermediate.
//!
//! ## Requests Are Values
//!
//! The target size is an [`imaging::ScaleRequest`] argument of every
//! retrieval call. A [`retrieve::Retriever`] has no mutable state and can be
//! shared between threads serving different sizes.
//!
//! ## Never Erase the Only Content
//!
//! [`imaging::despeckle`] leaves an image with zero or one component
//! untouched, however small that component is. A page whose only ink is a
//! stamp or a page number keeps it.

pub mod config;
pub mod imaging;
pub mod layout;
pub mod output;
pub mod preprocess;
pub mod retrieve;
