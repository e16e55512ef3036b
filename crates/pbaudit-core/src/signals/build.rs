//! Signal derivation.
//!
//! Transforms the raw inventory into the rule-ready signal bundle.
//! This is a pure structural computation: no filesystem access, no policy,
//! and identical inventories always produce identical signals.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::pbip::inventory::Inventory;
use crate::pbip::queries::QuerySourceItem;
use crate::signals::model::*;
use crate::signals::patterns::*;

const HIT_CLIP: usize = 220;
const HITS_EVIDENCE_CAP: usize = 25;
const TOP_BREAKERS_CAP: usize = 8;
const OUTLIERS_CAP: usize = 50;

/// Derive the full signal bundle from an inventory snapshot.
pub fn build_signals(inventory: &Inventory) -> Signals {
    let param_names: Vec<String> = inventory
        .model
        .parameters
        .iter()
        .map(|p| p.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // Calculated and measure-holder tables are not real data-load tables;
    // they would distort folding and naming heuristics.
    let excluded_tables: BTreeSet<String> = inventory
        .model
        .tables
        .iter()
        .filter(|t| t.is_calculated || t.is_measures_only)
        .map(|t| t.name.clone())
        .collect();

    let items: Vec<QuerySourceItem> = inventory
        .power_query
        .queries
        .iter()
        .filter(|it| !excluded_tables.contains(&it.table))
        .cloned()
        .collect();

    let has_range = param_names
        .iter()
        .any(|n| n.eq_ignore_ascii_case("RangeStart") || n.eq_ignore_ascii_case("RangeEnd"))
        || items
            .iter()
            .any(|it| it.m_snippet.as_deref().is_some_and(|s| RE_RANGE.is_match(s)));

    let mut hardcoded_hits: Vec<HardcodedHit> = Vec::new();
    let mut source_coverage: Vec<SourceCoverage> = Vec::new();
    let mut source_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut table_sources: Vec<TableSources> = Vec::new();
    let mut folding_by_table: Vec<FoldingRisk> = Vec::new();
    let mut breaker_counts: BTreeMap<String, usize> = BTreeMap::new();

    for item in &items {
        let snippet = item.m_snippet.as_deref().unwrap_or_default();

        // Literal-pattern tables first; generic host/URL shape as fallback.
        let matched_literal = SOURCE_LITERAL_PATTERNS
            .iter()
            .find_map(|rx| rx.find(snippet))
            .map(|m| clip_hit(m.as_str()));
        let generic_host_hit = if matched_literal.is_none() {
            RE_HARDCODED_HOST.find(snippet).map(|m| clip_hit(m.as_str()))
        } else {
            None
        };
        let literal_hit = matched_literal.or(generic_host_hit);

        let references_param = param_names.iter().any(|pn| {
            Regex::new(&format!(r"\b{}\b", regex::escape(pn)))
                .map(|rx| rx.is_match(snippet))
                .unwrap_or(false)
        });
        let is_param_source = RE_SOURCE_PARAM_HINT.is_match(snippet) || references_param;

        if let Some(hit) = &literal_hit {
            hardcoded_hits.push(HardcodedHit {
                table: item.table.clone(),
                path: item.path.clone(),
                hit: hit.clone(),
            });
        }

        // Exactly one status per item.
        let status = if literal_hit.is_some() {
            ParamStatus::HardcodedOrLiteral
        } else if is_param_source {
            ParamStatus::Parameterized
        } else {
            ParamStatus::Unknown
        };
        source_coverage.push(SourceCoverage {
            table: item.table.clone(),
            path: item.path.clone(),
            status,
        });

        let mut matched_sources: BTreeSet<String> = BTreeSet::new();
        for (rx, name) in SOURCE_PATTERNS.iter() {
            if rx.is_match(snippet) {
                matched_sources.insert((*name).to_string());
                *source_counts.entry((*name).to_string()).or_default() += 1;
            }
        }
        if item.is_native_query {
            matched_sources.insert("Native Query".to_string());
            *source_counts.entry("Native Query".to_string()).or_default() += 1;
        }
        let sources: Vec<String> = if matched_sources.is_empty() {
            *source_counts.entry("Unknown".to_string()).or_default() += 1;
            vec!["Unknown".to_string()]
        } else {
            matched_sources.into_iter().collect()
        };
        table_sources.push(TableSources {
            table: item.table.clone(),
            path: item.path.clone(),
            sources,
        });

        let mut breakers = Vec::new();
        for (rx, label) in FOLDING_BREAKERS.iter() {
            if rx.is_match(snippet) {
                breakers.push((*label).to_string());
                *breaker_counts.entry((*label).to_string()).or_default() += 1;
            }
        }
        folding_by_table.push(FoldingRisk {
            table: item.table.clone(),
            path: item.path.clone(),
            breakers,
            step_count: RE_STEP.find_iter(snippet).count(),
            heavy_ops: RE_HEAVY.find_iter(snippet).count(),
            has_filter_hint: RE_FILTER.is_match(snippet),
            is_native_query: item.is_native_query,
        });
    }

    let mut top_breakers: Vec<BreakerCount> = breaker_counts
        .into_iter()
        .map(|(pattern, count)| BreakerCount { pattern, count })
        .collect();
    top_breakers.sort_by(|a, b| b.count.cmp(&a.count).then(a.pattern.cmp(&b.pattern)));
    top_breakers.truncate(TOP_BREAKERS_CAP);

    let naming = build_naming(inventory, &excluded_tables);

    let mut connectors: Vec<ConnectorCount> = source_counts
        .into_iter()
        .map(|(name, count)| ConnectorCount { name, count })
        .collect();
    connectors.sort_by(|a, b| b.count.cmp(&a.count).then(a.name.cmp(&b.name)));
    let distinct = connectors.iter().filter(|c| c.name != "Unknown").count();

    let full_hit_count = hardcoded_hits.len();
    hardcoded_hits.truncate(HITS_EVIDENCE_CAP);

    Signals {
        parameters: ParameterSignals { names: param_names },
        incremental: IncrementalSignals {
            has_range_params_or_refs: has_range,
        },
        power_query: PowerQuerySignals {
            count: items.len(),
            items,
            excluded_tables: excluded_tables.into_iter().collect(),
            top_folding_breakers: top_breakers,
            folding_by_table,
        },
        hardcoding: HardcodingSignals {
            hits: hardcoded_hits,
            count: full_hit_count,
            source_coverage,
        },
        sources: SourceSignals {
            count_distinct: distinct,
            multiple_sources: distinct > 1,
            connectors,
            table_sources,
        },
        naming,
        model: ModelSignals {
            tables_count: inventory.model.tables_count,
            relationships_count: inventory.model.relationships.count,
        },
        report: ReportSignals {
            page_count: inventory.report.page_count,
            theme_present: inventory.report.theme_present,
        },
    }
}

fn clip_hit(text: &str) -> String {
    text.chars().take(HIT_CLIP).collect()
}

/// Classify a table name into a fixed style set, first match wins.
pub fn table_name_style(name: &str) -> &'static str {
    static RE_SNAKE: std::sync::LazyLock<Regex> =
        std::sync::LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());
    static RE_PASCAL: std::sync::LazyLock<Regex> =
        std::sync::LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap());
    static RE_CAMEL: std::sync::LazyLock<Regex> =
        std::sync::LazyLock::new(|| Regex::new(r"^[a-z][A-Za-z0-9]*$").unwrap());

    if RE_SNAKE.is_match(name) {
        "snake_case"
    } else if RE_PASCAL.is_match(name) {
        "PascalCase"
    } else if RE_CAMEL.is_match(name) && name.chars().any(|c| c.is_ascii_uppercase()) {
        "camelCase"
    } else if name.contains(' ') {
        "space_separated"
    } else if name.contains('-') {
        "kebab-case"
    } else {
        "other"
    }
}

fn build_naming(inventory: &Inventory, excluded: &BTreeSet<String>) -> NamingSignals {
    let table_names: Vec<&str> = inventory
        .model
        .tables
        .iter()
        .filter(|t| !t.name.is_empty() && !excluded.contains(&t.name))
        .map(|t| t.name.as_str())
        .collect();

    let mut style_counts: BTreeMap<String, usize> = BTreeMap::new();
    for name in &table_names {
        *style_counts.entry(table_name_style(name).to_string()).or_default() += 1;
    }

    // Ties are broken by BTreeMap iteration order: deterministic for the
    // same input, but otherwise arbitrary.
    let dominant = style_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(style, count)| (style.clone(), *count));

    let (dominant_style, dominant_count) = match dominant {
        Some((s, c)) => (Some(s), c),
        None => (None, 0),
    };

    let outliers: Vec<String> = match dominant_style.as_deref() {
        Some(dominant) => table_names
            .iter()
            .filter(|n| table_name_style(n) != dominant)
            .map(|n| n.to_string())
            .take(OUTLIERS_CAP)
            .collect(),
        None => Vec::new(),
    };

    NamingSignals {
        dominant_coverage: if table_names.is_empty() {
            None
        } else {
            Some(dominant_count as f64 / table_names.len() as f64)
        },
        table_count: table_names.len(),
        table_styles: style_counts,
        dominant_table_style: dominant_style,
        outlier_tables: outliers,
    }
}
