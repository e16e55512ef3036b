//! PBIP project extraction.
//!
//! A PBIP project is a directory tree of loosely structured text files:
//! TMDL table/relationship/expression definitions under `*.SemanticModel`
//! and JSON page/visual definitions under `*.Report`. The modules here turn
//! that tree into a normalized inventory using best-effort pattern matching.
//! None of this is a parser for the underlying formats; resilience beats
//! completeness throughout.

pub mod inventory;
pub mod locate;
pub mod pages;
pub mod queries;
pub mod tables;

use std::path::Path;

/// Marker appended to every clipped snippet so downstream consumers can
/// recognize truncated evidence.
pub const TRUNCATION_MARKER: &str = "\n...<clipped>...";

/// Read a definition file as text, tolerating invalid UTF-8.
///
/// An unreadable or missing file yields an empty string: extraction must
/// degrade to empty facets rather than abort the run on one bad file.
pub(crate) fn read_text_lossy(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "definition file unreadable");
            String::new()
        }
    }
}

/// Clip `text` to at most `max_chars` characters, appending the truncation
/// marker when anything was dropped.
pub(crate) fn clip(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
