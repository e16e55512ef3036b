//! Naming-convention rules.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::rules::catalog::{Category, Finding, RuleContext, RuleId, Severity};

/// Exact names the designer tooling assigns by default.
const BAD_EXACT: [&str; 4] = ["Query1", "Query2", "New Query", "NewQuery"];
/// Substrings that mark a name as scratch work (case-insensitive).
const BAD_CONTAINS: [&str; 4] = ["Copy of", "Final", "Temp", "Test"];

static RE_DEFAULT_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Query\d+$").unwrap());

const OUTLIER_EVIDENCE_CAP: usize = 25;

fn finding(
    id: &str,
    severity: Severity,
    title: &str,
    message: String,
    recommendation: &str,
    evidence: serde_json::Value,
) -> Finding {
    Finding {
        rule_id: RuleId(id.to_string()),
        category: Category::Naming,
        severity,
        title: title.to_string(),
        message,
        recommendation: recommendation.to_string(),
        evidence,
    }
}

fn is_bad_query_name(name: &str) -> bool {
    if BAD_EXACT.contains(&name) || RE_DEFAULT_QUERY.is_match(name) {
        return true;
    }
    let lower = name.to_lowercase();
    BAD_CONTAINS.iter().any(|s| lower.contains(&s.to_lowercase()))
}

/// NC003: default-like or scratch query names among the retained queries.
pub fn nc003_bad_query_names(ctx: &RuleContext) -> Vec<Finding> {
    let mut out = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for item in &ctx.signals.power_query.items {
        if seen.contains(&item.table.as_str()) || !is_bad_query_name(&item.table) {
            continue;
        }
        seen.push(&item.table);
        out.push(finding(
            "NC003",
            Severity::LOW,
            "Query naming has bad defaults",
            format!("Query name '{}' is non-descriptive or default-like.", item.table),
            "Rename queries to meaningful names aligned with purpose (e.g., dim_Date, \
             fact_Claim).",
            json!({ "query": item.table }),
        ));
    }
    out
}

/// NC010: outliers against the dominant table naming style. LOW when the
/// dominant style covers at least half the tables, MED below that.
pub fn nc010_naming_outliers(ctx: &RuleContext) -> Vec<Finding> {
    let naming = &ctx.signals.naming;
    let Some(dominant) = naming.dominant_table_style.as_deref() else {
        return Vec::new();
    };
    if naming.outlier_tables.is_empty() {
        return Vec::new();
    }
    let severity = if naming.dominant_coverage.unwrap_or(0.0) >= 0.5 {
        Severity::LOW
    } else {
        Severity::MED
    };
    vec![finding(
        "NC010",
        severity,
        "Inconsistent table naming convention",
        format!(
            "Dominant table naming style is '{}', but {} table names are outliers.",
            dominant,
            naming.outlier_tables.len()
        ),
        "Adopt the dominant naming style and rename outliers for consistency.",
        json!({
            "dominantStyle": dominant,
            "styleDistribution": naming.table_styles,
            "outliers": naming
                .outlier_tables
                .iter()
                .take(OUTLIER_EVIDENCE_CAP)
                .collect::<Vec<_>>(),
        }),
    )]
}

/// NC011: informational restatement of the dominant style.
pub fn nc011_dominant_style(ctx: &RuleContext) -> Vec<Finding> {
    let naming = &ctx.signals.naming;
    let Some(dominant) = naming.dominant_table_style.as_deref() else {
        return Vec::new();
    };
    vec![finding(
        "NC011",
        Severity::INFO,
        "Detected dominant table naming convention",
        format!("Dominant style inferred as '{dominant}' across model tables."),
        "Use this style as the project naming standard for new objects.",
        json!({
            "styleDistribution": naming.table_styles,
            "dominantCoverage": naming.dominant_coverage,
        }),
    )]
}
