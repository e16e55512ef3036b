use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pbip::queries::QuerySourceItem;

/// Derived, read-only metrics keyed by topic.
///
/// Signals are a pure function of the inventory: recomputing from the same
/// inventory must yield identical output. Every facet defaults to empty, so
/// a missing inventory fragment is a first-class state rather than an
/// access failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signals {
    pub parameters: ParameterSignals,
    pub incremental: IncrementalSignals,
    pub power_query: PowerQuerySignals,
    pub hardcoding: HardcodingSignals,
    pub sources: SourceSignals,
    pub naming: NamingSignals,
    pub model: ModelSignals,
    pub report: ReportSignals,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterSignals {
    /// Sorted, deduplicated parameter names.
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncrementalSignals {
    /// True when a range parameter name appears in the parameter list or
    /// inside any retained query snippet.
    pub has_range_params_or_refs: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PowerQuerySignals {
    pub count: usize,
    /// Retained items after the calculated/measure-holder exclusion.
    pub items: Vec<QuerySourceItem>,
    pub excluded_tables: Vec<String>,
    pub top_folding_breakers: Vec<BreakerCount>,
    pub folding_by_table: Vec<FoldingRisk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerCount {
    pub pattern: String,
    pub count: usize,
}

/// Per-table folding-risk observations. "Late filtering" is judged by the
/// rules layer, not recorded here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FoldingRisk {
    pub table: String,
    pub path: String,
    pub breakers: Vec<String>,
    pub step_count: usize,
    pub heavy_ops: usize,
    pub has_filter_hint: bool,
    pub is_native_query: bool,
}

/// Exactly one status per retained item; never zero, never two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParamStatus {
    #[serde(rename = "parameterized")]
    Parameterized,
    #[serde(rename = "hardcodedOrLiteral")]
    HardcodedOrLiteral,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardcodedHit {
    pub table: String,
    pub path: String,
    /// Matched text, first 220 characters.
    pub hit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCoverage {
    pub table: String,
    pub path: String,
    pub status: ParamStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardcodingSignals {
    /// Bounded evidence sample; `count` is the full hit count.
    pub hits: Vec<HardcodedHit>,
    pub count: usize,
    pub source_coverage: Vec<SourceCoverage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSources {
    pub table: String,
    pub path: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceSignals {
    pub connectors: Vec<ConnectorCount>,
    pub table_sources: Vec<TableSources>,
    /// Distinct recognized connectors; `Unknown` does not count.
    pub count_distinct: usize,
    pub multiple_sources: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamingSignals {
    pub table_styles: BTreeMap<String, usize>,
    pub dominant_table_style: Option<String>,
    /// dominant style count / analyzed table count; None without tables.
    pub dominant_coverage: Option<f64>,
    pub outlier_tables: Vec<String>,
    pub table_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSignals {
    pub tables_count: usize,
    pub relationships_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSignals {
    pub page_count: usize,
    pub theme_present: bool,
}
