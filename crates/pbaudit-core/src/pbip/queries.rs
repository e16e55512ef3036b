//! Embedded query-source extraction.
//!
//! Table definition files carry their load expressions as `Source =`
//! blocks with no closing delimiter, so block extraction scans forward
//! from each assignment until the next line that looks like a new
//! top-level property, a partition/measure declaration, or end of file.
//! Classification is heuristic: the patterns below trade false positives
//! for never missing an M-shaped block entirely.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pbip::clip;
use crate::pbip::locate::PbipContext;
use crate::pbip::read_text_lossy;

/// Snippets are clipped to this many characters before storage.
pub const SNIPPET_CLIP: usize = 1200;

const CONFIDENCE_NATIVE: f64 = 0.90;
const CONFIDENCE_M: f64 = 0.80;
const CONFIDENCE_DAX: f64 = 0.85;
const CONFIDENCE_UNKNOWN: f64 = 0.30;

static RE_SOURCE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Source\s*=\s*(.*)$").unwrap());
// Next top-level property assignment ends the block. This also stops at
// unquoted intermediate step names; quoted steps (#"...") pass through.
static RE_PROPERTY_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z_][A-Za-z0-9_ \[\]\-]*=").unwrap());
static RE_DECL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(partition|measure)\b").unwrap());

// M hints: let/in keywords, well-known connector calls, or Table.* ops.
// Matches inside string literals too; acceptable noise for a presence check.
static RE_M_HINTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)\b(let|in)\b|\b(Sql\.Database|Odbc\.DataSource|OleDb\.DataSource|Snowflake\.Databases|Databricks\.Catalogs|SapHana\.Database|GoogleBigQuery\.Database)\b|\bTable\.(SelectRows|RemoveColumns|RenameColumns|TransformColumns|Group|Join|NestedJoin|AddColumn|ExpandTableColumn|Buffer)\b",
    )
    .unwrap()
});
static RE_NATIVE_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bValue\.NativeQuery\s*\(").unwrap());
// NAMEOF / tuple-literal shapes show up in calculated-table expressions.
static RE_DAXISH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bNAMEOF\s*\(|\{\s*\(""#).unwrap());
static RE_SQL_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(SELECT|WITH|FROM|JOIN|GROUP\s+BY|WHERE)\b").unwrap());

/// Classification of one extracted source block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    M,
    NativeQuery,
    DaxOrOther,
    Unknown,
}

/// One `Source =` block found in a table definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySourceItem {
    pub table: String,
    pub path: String,
    pub kind: String,
    pub source_type: SourceType,
    pub is_native_query: bool,
    #[serde(rename = "containsSQL")]
    pub contains_sql: bool,
    pub m_snippet: Option<String>,
    /// Fixed heuristic weight for the classification, in [0, 1].
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExtraction {
    /// Number of PQ-relevant items (`queries`), not of raw blocks.
    pub count: usize,
    #[serde(rename = "source_type")]
    pub source_type: String,
    /// Retained items: classified `m` or `nativeQuery` with a snippet.
    /// Only these feed signal computation.
    pub queries: Vec<QuerySourceItem>,
    /// Every extracted block, kept for diagnostics.
    pub raw_items: Vec<QuerySourceItem>,
}

/// Scan all table definition files for source blocks and classify them.
///
/// A missing semantic model or tables directory yields an empty
/// extraction, never an error.
pub fn extract_powerquery(ctx: &PbipContext) -> QueryExtraction {
    let Some(tables_dir) = ctx
        .model_dir
        .as_deref()
        .map(|m| m.join("definition").join("tables"))
        .filter(|d| d.exists())
    else {
        return QueryExtraction {
            source_type: "table_source_scan".to_string(),
            ..Default::default()
        };
    };

    let mut files: Vec<_> = std::fs::read_dir(&tables_dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "tmdl"))
                .collect()
        })
        .unwrap_or_default();
    files.sort();

    let mut raw_items = Vec::new();
    for path in &files {
        let table = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = read_text_lossy(path);
        for block in extract_source_blocks(&text) {
            raw_items.push(classify_block(&table, path, &block));
        }
    }

    let queries: Vec<QuerySourceItem> = raw_items
        .iter()
        .filter(|it| {
            matches!(it.source_type, SourceType::M | SourceType::NativeQuery)
                && it.m_snippet.as_deref().is_some_and(|s| !s.is_empty())
        })
        .cloned()
        .collect();

    QueryExtraction {
        count: queries.len(),
        source_type: "table_source_scan".to_string(),
        queries,
        raw_items,
    }
}

/// Collect each block starting at a `Source =` line and running until the
/// next boundary line. Multiple blocks per file each become one item.
fn extract_source_blocks(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = RE_SOURCE_START.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let mut block = caps[1].to_string();
        let mut j = i + 1;
        while j < lines.len() && !is_boundary(lines[j]) {
            block.push('\n');
            block.push_str(lines[j]);
            j += 1;
        }
        let block = block.trim().to_string();
        if !block.is_empty() {
            blocks.push(block);
        }
        // Resume at the boundary line; it may itself start the next block.
        i = j;
    }

    blocks
}

fn is_boundary(line: &str) -> bool {
    RE_DECL_BOUNDARY.is_match(line) || RE_PROPERTY_BOUNDARY.is_match(line)
}

fn classify_block(table: &str, path: &Path, block: &str) -> QuerySourceItem {
    let snippet = clip(block, SNIPPET_CLIP);
    let is_native = RE_NATIVE_QUERY.is_match(&snippet);
    let contains_sql = RE_SQL_TEXT.is_match(&snippet)
        || (snippet.contains("#(lf)") && snippet.to_uppercase().contains("SELECT"));

    let (source_type, confidence, m_snippet) =
        if RE_DAXISH.is_match(&snippet) && !RE_M_HINTS.is_match(&snippet) {
            (SourceType::DaxOrOther, CONFIDENCE_DAX, None)
        } else if is_native {
            (SourceType::NativeQuery, CONFIDENCE_NATIVE, Some(snippet.clone()))
        } else if RE_M_HINTS.is_match(&snippet) {
            (SourceType::M, CONFIDENCE_M, Some(snippet.clone()))
        } else {
            (SourceType::Unknown, CONFIDENCE_UNKNOWN, None)
        };

    QuerySourceItem {
        table: table.to_string(),
        path: path.display().to_string(),
        kind: "SourceBlock".to_string(),
        source_type,
        is_native_query: is_native,
        contains_sql,
        m_snippet,
        confidence,
    }
}
