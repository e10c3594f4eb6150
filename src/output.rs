//! CLI output formatting.
//!
//! Payload commands (`page`, `segment`, `line`, `list`) write only their
//! payload to stdout so it can be piped. The `despeckle` stage prints
//! progress in this shape:
//!
//! ```text
//! 0001 3 components, 2 removed
//!     → PreProc/Despeckled/0001.png
//! 0002 1 component, kept
//!     → PreProc/Despeckled/0002.png
//!
//! Despeckled 2 pages, removed 2 components
//! ```
//!
//! Each `format_*` function returns lines for testability; `print_*`
//! wrappers write them to stdout.

use crate::preprocess::DespeckleEvent;
use std::collections::BTreeMap;
use std::path::Path;

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Path relative to the project root when possible.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Progress lines for one despeckled page.
pub fn format_despeckle_event(event: &DespeckleEvent, root: &Path) -> Vec<String> {
    let outcome = if event.removed == 0 {
        "kept".to_string()
    } else {
        format!("{} removed", event.removed)
    };
    vec![
        format!(
            "{} {}, {}",
            event.page_id,
            plural(event.components, "component"),
            outcome
        ),
        format!("    → {}", display_path(&event.output, root)),
    ]
}

/// Closing line of a despeckle run.
pub fn format_despeckle_summary(events: &[DespeckleEvent]) -> String {
    let removed: usize = events.iter().map(|e| e.removed).sum();
    format!(
        "Despeckled {}, removed {}",
        plural(events.len(), "page"),
        plural(removed, "component")
    )
}

pub fn print_despeckle_summary(events: &[DespeckleEvent]) {
    println!();
    println!("{}", format_despeckle_summary(events));
}

/// JSON object of identifier → base64, in identifier order.
pub fn format_image_list(images: &BTreeMap<String, String>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(images)
}
