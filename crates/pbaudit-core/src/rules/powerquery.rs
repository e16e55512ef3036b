//! Power Query rules.
//!
//! All thresholds here are heuristics over extracted text, not validated
//! folding behavior. Each evaluator returns an empty list when its facet
//! is absent; none of them can fail.

use serde_json::json;

use crate::rules::catalog::{Category, Finding, RuleContext, RuleId, Severity};
use crate::signals::model::ParamStatus;
use crate::signals::patterns::{RE_RANGE, SOURCE_LITERAL_PATTERNS};

pub(crate) const STEP_BLOAT_THRESHOLD: usize = 25;
pub(crate) const HEAVY_OPS_THRESHOLD: usize = 3;
const MATCH_CLIP: usize = 200;

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
        category: Category::PowerQuery,
        severity,
        title: title.to_string(),
        message,
        recommendation: recommendation.to_string(),
        evidence,
    }
}

/// PQ000: nothing PQ-relevant was extracted, so query validation cannot run.
pub fn pq000_no_queries(ctx: &RuleContext) -> Vec<Finding> {
    if ctx.signals.power_query.count > 0 {
        return Vec::new();
    }
    vec![finding(
        "PQ000",
        Severity::HIGH,
        "No Power Query sources extracted",
        "No query source blocks were detected in the semantic-model table files.".to_string(),
        "Confirm the model has Import tables with source expressions in the table definition \
         files. If sources live elsewhere in this project variant, extend the extractor scan.",
        json!({ "powerQueryCount": 0 }),
    )]
}

/// PQ010: incremental refresh is optional; this restates that it is not
/// configured and lists the folding-risk tables that would gate it.
pub fn pq010_incremental_readiness(ctx: &RuleContext) -> Vec<Finding> {
    if ctx.signals.incremental.has_range_params_or_refs {
        return Vec::new();
    }
    let risky: Vec<_> = ctx
        .signals
        .power_query
        .folding_by_table
        .iter()
        .filter(|t| !t.breakers.is_empty())
        .collect();
    vec![finding(
        "PQ010",
        Severity::INFO,
        "No incremental refresh configuration detected",
        "Incremental refresh is optional and not currently configured (RangeStart/RangeEnd \
         not detected)."
            .to_string(),
        "If you choose to configure incremental refresh, first make sure key source queries \
         are foldable, then add RangeStart/RangeEnd parameters with an early date filter.",
        json!({
            "paramNames": ctx.signals.parameters.names,
            "foldingRiskTables": risky
                .iter()
                .take(10)
                .map(|t| json!({ "table": t.table, "breakers": t.breakers }))
                .collect::<Vec<_>>(),
        }),
    )]
}

/// PQ020: aggregated hardcoded host/path/url hits.
pub fn pq020_hardcoded_sources(ctx: &RuleContext) -> Vec<Finding> {
    let hardcoding = &ctx.signals.hardcoding;
    if hardcoding.count == 0 {
        return Vec::new();
    }
    vec![finding(
        "PQ020",
        Severity::HIGH,
        "Hard-coded source references detected",
        format!(
            "Detected {} source snippets with hard-coded host/path/url literals.",
            hardcoding.count
        ),
        "Move source values to parameters (e.g., Host, Server, Database, ApiBaseUrl) and \
         reference those parameters in source steps.",
        json!({
            "examples": hardcoding.hits.iter().take(10).collect::<Vec<_>>(),
        }),
    )]
}

/// PQ001: per-query literal-pattern match. Overlaps PQ020 by design: PQ020
/// summarizes, this one pins each offending query.
pub fn pq001_hardcoded_source_per_query(ctx: &RuleContext) -> Vec<Finding> {
    let mut out = Vec::new();
    for item in &ctx.signals.power_query.items {
        let Some(snippet) = item.m_snippet.as_deref() else {
            continue;
        };
        let Some(m) = SOURCE_LITERAL_PATTERNS.iter().find_map(|rx| rx.find(snippet)) else {
            continue;
        };
        out.push(finding(
            "PQ001",
            Severity::HIGH,
            "Hardcoded data source detected",
            format!("Query '{}' appears to use a hardcoded source.", item.table),
            "Parameterize server/database/file/url and reference parameters in the Source step.",
            json!({
                "query": item.table,
                "match": m.as_str().chars().take(MATCH_CLIP).collect::<String>(),
            }),
        ));
    }
    out
}

/// PQ021: coverage gap — retained queries that are not confidently
/// parameterized.
pub fn pq021_unparameterized(ctx: &RuleContext) -> Vec<Finding> {
    let coverage = &ctx.signals.hardcoding.source_coverage;
    let non_param: Vec<_> = coverage
        .iter()
        .filter(|c| c.status != ParamStatus::Parameterized)
        .collect();
    if coverage.is_empty() || non_param.is_empty() {
        return Vec::new();
    }
    vec![finding(
        "PQ021",
        Severity::MED,
        "Not all extracted queries appear parameterized",
        format!(
            "{} of {} extracted sources are not confidently parameterized.",
            non_param.len(),
            coverage.len()
        ),
        "Standardize source access so each query uses shared parameters or parameterized \
         functions.",
        json!({ "nonParameterized": non_param.iter().take(15).collect::<Vec<_>>() }),
    )]
}

/// PQ030: per-table folding breakers. Escalates to HIGH when the offending
/// item is also a native query.
pub fn pq030_folding_breakers(ctx: &RuleContext) -> Vec<Finding> {
    let mut out = Vec::new();
    for risk in &ctx.signals.power_query.folding_by_table {
        if risk.breakers.is_empty() {
            continue;
        }
        let severity = if risk.is_native_query {
            Severity::HIGH
        } else {
            Severity::MED
        };
        out.push(finding(
            "PQ030",
            severity,
            "Potential query folding breakers detected",
            format!("'{}' contains patterns that commonly prevent folding.", risk.table),
            "Reorder steps so filters happen early, avoid Table.Buffer unless proven \
             necessary, and validate folding with View Native Query / diagnostics.",
            json!({
                "table": risk.table,
                "path": risk.path,
                "breakers": risk.breakers.iter().take(6).collect::<Vec<_>>(),
            }),
        ));
    }
    out
}

/// PQ031: transformation chains with 25+ steps.
pub fn pq031_step_bloat(ctx: &RuleContext) -> Vec<Finding> {
    let bloated: Vec<_> = ctx
        .signals
        .power_query
        .folding_by_table
        .iter()
        .filter(|t| t.step_count >= STEP_BLOAT_THRESHOLD)
        .collect();
    if bloated.is_empty() {
        return Vec::new();
    }
    vec![finding(
        "PQ031",
        Severity::LOW,
        "Large transformation chains detected",
        format!(
            "{} tables have {}+ transformation steps.",
            bloated.len(),
            STEP_BLOAT_THRESHOLD
        ),
        "Simplify transformations (merge renames/type changes) and move heavy logic \
         upstream where practical.",
        json!({
            "tables": bloated
                .iter()
                .take(15)
                .map(|t| json!({ "table": t.table, "stepCount": t.step_count }))
                .collect::<Vec<_>>(),
        }),
    )]
}

/// PQ032: heavy transformations with no filter hint anywhere in the chain.
/// A coarse late-filtering proxy, not a folding guarantee.
pub fn pq032_late_filtering(ctx: &RuleContext) -> Vec<Finding> {
    let late: Vec<_> = ctx
        .signals
        .power_query
        .folding_by_table
        .iter()
        .filter(|t| t.heavy_ops >= HEAVY_OPS_THRESHOLD && !t.has_filter_hint)
        .collect();
    if late.is_empty() {
        return Vec::new();
    }
    vec![finding(
        "PQ032",
        Severity::MED,
        "Filters may be applied late",
        format!(
            "{} tables show several heavy operations with no filter hint.",
            late.len()
        ),
        "Apply row filters (Table.SelectRows) as early as possible to improve folding and \
         refresh performance.",
        json!({
            "tables": late
                .iter()
                .take(15)
                .map(|t| json!({ "table": t.table, "heavyOps": t.heavy_ops }))
                .collect::<Vec<_>>(),
        }),
    )]
}

/// PQ230: a native query that references range parameters often undermines
/// incremental-refresh folding and can force full retrieval.
pub fn pq230_native_with_range(ctx: &RuleContext) -> Vec<Finding> {
    let mut out = Vec::new();
    for item in &ctx.signals.power_query.items {
        let Some(snippet) = item.m_snippet.as_deref() else {
            continue;
        };
        if !item.is_native_query || !RE_RANGE.is_match(snippet) {
            continue;
        }
        out.push(finding(
            "PQ230",
            Severity::HIGH,
            "Native query combined with incremental parameters",
            format!(
                "'{}' uses a native query and references RangeStart/RangeEnd.",
                item.table
            ),
            "Validate incremental refresh folding carefully; push the range filter into the \
             native query in a folding-friendly shape and test refresh behavior.",
            json!({ "table": item.table, "path": item.path }),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbip::inventory::Inventory;
    use crate::pbip::queries::{QuerySourceItem, SourceType};
    use crate::signals::model::{FoldingRisk, Signals};

    fn empty_inventory() -> Inventory {
        use crate::pbip::inventory::{PathsMeta, ProjectMeta};
        Inventory {
            project: ProjectMeta {
                root_dir: String::new(),
                name: String::new(),
            },
            paths: PathsMeta {
                report_dir: String::new(),
                semantic_model_dir: String::new(),
            },
            power_query: Default::default(),
            report: Default::default(),
            model: Default::default(),
        }
    }

    fn item(table: &str, snippet: &str, native: bool) -> QuerySourceItem {
        QuerySourceItem {
            table: table.to_string(),
            path: format!("{table}.tmdl"),
            kind: "SourceBlock".into(),
            source_type: if native { SourceType::NativeQuery } else { SourceType::M },
            is_native_query: native,
            contains_sql: false,
            m_snippet: Some(snippet.to_string()),
            confidence: if native { 0.90 } else { 0.80 },
        }
    }

    #[test]
    fn pq000_fires_only_when_nothing_extracted() {
        let inv = empty_inventory();
        let signals = Signals::default();
        let ctx = RuleContext { inventory: &inv, signals: &signals };
        let findings = pq000_no_queries(&ctx);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::HIGH);

        let mut with_queries = Signals::default();
        with_queries.power_query.count = 1;
        let ctx = RuleContext { inventory: &inv, signals: &with_queries };
        assert!(pq000_no_queries(&ctx).is_empty());
    }

    #[test]
    fn pq010_respects_readiness_signal() {
        let inv = empty_inventory();
        let mut signals = Signals::default();
        signals.incremental.has_range_params_or_refs = true;
        let ctx = RuleContext { inventory: &inv, signals: &signals };
        assert!(pq010_incremental_readiness(&ctx).is_empty());

        signals.incremental.has_range_params_or_refs = false;
        let ctx = RuleContext { inventory: &inv, signals: &signals };
        let findings = pq010_incremental_readiness(&ctx);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::INFO);
    }

    #[test]
    fn pq001_pins_each_hardcoded_query() {
        let inv = empty_inventory();
        let mut signals = Signals::default();
        signals.power_query.items = vec![
            item("Sales", r#"Sql.Database("srv.example.com", "SalesDB")"#, false),
            item("Clean", "Sql.Database(Host, Db)", false),
        ];
        let ctx = RuleContext { inventory: &inv, signals: &signals };
        let findings = pq001_hardcoded_source_per_query(&ctx);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence["query"], "Sales");
        assert!(findings[0].evidence["match"].as_str().unwrap().len() <= 200);
    }

    #[test]
    fn pq030_escalates_for_native_queries() {
        let inv = empty_inventory();
        let mut signals = Signals::default();
        signals.power_query.folding_by_table = vec![
            FoldingRisk {
                table: "A".into(),
                breakers: vec!["Table.Buffer".into()],
                ..Default::default()
            },
            FoldingRisk {
                table: "B".into(),
                breakers: vec!["Odbc.Query".into()],
                is_native_query: true,
                ..Default::default()
            },
            FoldingRisk { table: "C".into(), ..Default::default() },
        ];
        let ctx = RuleContext { inventory: &inv, signals: &signals };
        let findings = pq030_folding_breakers(&ctx);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::MED);
        assert_eq!(findings[1].severity, Severity::HIGH);
    }

    #[test]
    fn pq031_and_pq032_threshold_behavior() {
        let inv = empty_inventory();
        let mut signals = Signals::default();
        signals.power_query.folding_by_table = vec![
            FoldingRisk {
                table: "Bloated".into(),
                step_count: 30,
                heavy_ops: 4,
                has_filter_hint: false,
                ..Default::default()
            },
            FoldingRisk {
                table: "Fine".into(),
                step_count: 5,
                heavy_ops: 4,
                has_filter_hint: true,
                ..Default::default()
            },
        ];
        let ctx = RuleContext { inventory: &inv, signals: &signals };

        let bloat = pq031_step_bloat(&ctx);
        assert_eq!(bloat.len(), 1);
        assert_eq!(bloat[0].severity, Severity::LOW);

        let late = pq032_late_filtering(&ctx);
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].evidence["tables"][0]["table"], "Bloated");
    }

    #[test]
    fn pq230_requires_both_native_and_range() {
        let inv = empty_inventory();
        let mut signals = Signals::default();
        signals.power_query.items = vec![
            item("NativeRange", r#"Value.NativeQuery(db, "... RangeStart ...")"#, true),
            item("NativeOnly", r#"Value.NativeQuery(db, "SELECT 1")"#, true),
            item("RangeOnly", "Table.SelectRows(t, each [d] >= RangeStart)", false),
        ];
        let ctx = RuleContext { inventory: &inv, signals: &signals };
        let findings = pq230_native_with_range(&ctx);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence["table"], "NativeRange");
        assert_eq!(findings[0].severity, Severity::HIGH);
    }
}
