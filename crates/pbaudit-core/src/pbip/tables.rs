//! Semantic-model inventory: tables, relationships, parameters.
//!
//! TMDL in the wild is inconsistently shaped, so everything here is
//! line-anchored pattern matching with deliberate leniency: a file with no
//! recognizable markers still yields a table record, and a relationship
//! block missing an endpoint is dropped without comment.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pbip::locate::PbipContext;
use crate::pbip::{clip, read_text_lossy};

const SAMPLE_CAP: usize = 15;
const PREVIEW_CLIP: usize = 200;

static RE_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*column\s+(?:'([^']+)'|([A-Za-z0-9 _\-\.\[\]]+))").unwrap());
static RE_MEASURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*measure\s+(?:'([^']+)'|([A-Za-z0-9 _\-\.\[\]]+))").unwrap());
static RE_PARTITION_MODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*partition\s+.+?=\s*([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static RE_CROSS_FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"crossFilteringBehavior:\s*([A-Za-z]+)").unwrap());
static RE_FROM_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fromColumn:\s*([^\r\n]+)").unwrap());
static RE_TO_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"toColumn:\s*([^\r\n]+)").unwrap());
static RE_RELATIONSHIP_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*relationship\s+(.+?)\s*$").unwrap());
static RE_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)expression\s+([A-Za-z0-9_ ]+?)\s*=\s*(.+?)\s*meta\s*\[(.*?)\]").unwrap());
static RE_IS_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bIsParameterQuery\s*=\s*true\b").unwrap());

/// Storage/refresh mode declared on a table's partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartitionMode {
    #[serde(rename = "import")]
    Import,
    #[serde(rename = "directQuery")]
    DirectQuery,
    #[serde(rename = "calculated")]
    Calculated,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl PartitionMode {
    fn parse(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "import" => Self::Import,
            "directquery" => Self::DirectQuery,
            "calculated" => Self::Calculated,
            _ => Self::Unknown,
        }
    }
}

/// One table record per definition file, even when zero patterns match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub path: String,
    pub columns_count: usize,
    pub measures_count: usize,
    pub columns_sample: Vec<String>,
    pub measures_sample: Vec<String>,
    pub partition_mode: PartitionMode,
    pub is_calculated: bool,
    /// Measures but effectively no data columns: a "measure holder" that is
    /// excluded from query and naming analysis.
    pub is_measures_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossFilter {
    #[default]
    #[serde(rename = "singleDirection")]
    SingleDirection,
    #[serde(rename = "both")]
    Both,
}

impl CrossFilter {
    /// TMDL spells bidirectional filtering either `both` or
    /// `bothDirections` depending on exporter version.
    fn parse(token: &str) -> Self {
        if token.to_ascii_lowercase().starts_with("both") {
            Self::Both
        } else {
            Self::SingleDirection
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub cross_filtering_behavior: CrossFilter,
    pub from_column: String,
    pub to_column: String,
    pub from_table: String,
    pub to_table: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipExtraction {
    pub count: usize,
    pub relationships: Vec<Relationship>,
}

/// A named expression qualifies as a parameter only with the explicit
/// `IsParameterQuery = true` marker in its meta segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub value_preview: Option<String>,
    pub meta_preview: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelExtraction {
    pub tables_count: usize,
    pub tables: Vec<Table>,
    pub relationships: RelationshipExtraction,
    pub parameters: Vec<Parameter>,
}

/// Build the semantic-model inventory from `<model>/definition`.
///
/// Missing directories and files yield empty facets; this function only
/// touches files it can name up front and never errors.
pub fn extract_semantic_model(ctx: &PbipContext) -> ModelExtraction {
    let Some(model_dir) = ctx.model_dir.as_deref() else {
        return ModelExtraction::default();
    };
    let definition = model_dir.join("definition");

    let tables = scan_tables(&definition.join("tables"));
    let relationships = scan_relationships(&definition.join("relationships.tmdl"));
    let parameters = scan_parameters(&definition.join("expressions.tmdl"));

    ModelExtraction {
        tables_count: tables.len(),
        tables,
        relationships,
        parameters,
    }
}

fn scan_tables(tables_dir: &Path) -> Vec<Table> {
    let mut files: Vec<_> = std::fs::read_dir(tables_dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "tmdl"))
                .collect()
        })
        .unwrap_or_default();
    files.sort();

    files.iter().map(|path| parse_table_file(path)).collect()
}

fn parse_table_file(path: &Path) -> Table {
    let text = read_text_lossy(path);
    let columns = captured_names(&RE_COLUMN, &text);
    let measures = captured_names(&RE_MEASURE, &text);

    let partition_mode = RE_PARTITION_MODE
        .captures(&text)
        .map(|c| PartitionMode::parse(&c[1]))
        .unwrap_or_default();

    let columns_count = columns.len();
    let measures_count = measures.len();
    let is_calculated = partition_mode == PartitionMode::Calculated;
    let is_measures_only = measures_count > 0 && columns_count <= 1;

    Table {
        name: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.display().to_string(),
        columns_count,
        measures_count,
        columns_sample: columns.into_iter().take(SAMPLE_CAP).collect(),
        measures_sample: measures.into_iter().take(SAMPLE_CAP).collect(),
        partition_mode,
        is_calculated,
        is_measures_only,
    }
}

fn captured_names(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|c| {
            c.get(1)
                .or_else(|| c.get(2))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Split the relationships file into blocks delimited by the
/// `relationship` keyword. A block lacking either endpoint declaration is
/// dropped, not kept as a partial record.
fn scan_relationships(rels_file: &Path) -> RelationshipExtraction {
    if !rels_file.exists() {
        return RelationshipExtraction::default();
    }
    let text = read_text_lossy(rels_file);

    let mut blocks: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = RE_RELATIONSHIP_HEAD.captures(line) {
            blocks.push((caps[1].trim().to_string(), String::new()));
        } else if let Some((_, body)) = blocks.last_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }

    let mut relationships = Vec::new();
    for (id, body) in blocks {
        let from = RE_FROM_COLUMN.captures(&body).map(|c| c[1].trim().to_string());
        let to = RE_TO_COLUMN.captures(&body).map(|c| c[1].trim().to_string());
        let (Some(from_column), Some(to_column)) = (from, to) else {
            tracing::debug!(id, "relationship block missing an endpoint, dropped");
            continue;
        };

        let cross = RE_CROSS_FILTER
            .captures(&body)
            .map(|c| CrossFilter::parse(&c[1]))
            .unwrap_or_default();

        relationships.push(Relationship {
            id,
            cross_filtering_behavior: cross,
            from_table: endpoint_table(&from_column),
            to_table: endpoint_table(&to_column),
            from_column,
            to_column,
        });
    }

    RelationshipExtraction {
        count: relationships.len(),
        relationships,
    }
}

/// Extract the table part of an endpoint expression: `Table.Column` or
/// `'Quoted Table'.Column`.
fn endpoint_table(expr: &str) -> String {
    let Some((table, _)) = expr.split_once('.') else {
        return expr.to_string();
    };
    let table = table.trim();
    table
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(table)
        .to_string()
}

fn scan_parameters(expr_file: &Path) -> Vec<Parameter> {
    if !expr_file.exists() {
        return Vec::new();
    }
    let text = read_text_lossy(expr_file);

    RE_EXPRESSION
        .captures_iter(&text)
        .filter(|caps| RE_IS_PARAMETER.is_match(&caps[3]))
        .map(|caps| Parameter {
            name: caps[1].trim().to_string(),
            value_preview: Some(clip(&caps[2], PREVIEW_CLIP)),
            meta_preview: Some(clip(&caps[3], PREVIEW_CLIP)),
        })
        .collect()
}
