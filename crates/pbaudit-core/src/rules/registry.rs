//! Rule registry.
//!
//! Holds the closed, ordered set of rules and runs them uniformly. Order
//! affects only display order: rules are independent and side-effect-free,
//! so findings from one never influence another.

use crate::rules::catalog::{Category, Finding, Rule, RuleContext, Severity};
use crate::rules::{model, naming, powerquery, report};

pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// The default catalog. IDs are stable and never reused.
    pub fn default_catalog() -> Self {
        let rules = vec![
            Rule {
                id: "PQ000",
                category: Category::PowerQuery,
                title: "No Power Query sources extracted",
                default_severity: Severity::HIGH,
                eval: powerquery::pq000_no_queries,
            },
            Rule {
                id: "PQ010",
                category: Category::PowerQuery,
                title: "No incremental refresh configuration detected",
                default_severity: Severity::INFO,
                eval: powerquery::pq010_incremental_readiness,
            },
            Rule {
                id: "PQ020",
                category: Category::PowerQuery,
                title: "Hard-coded source references detected",
                default_severity: Severity::HIGH,
                eval: powerquery::pq020_hardcoded_sources,
            },
            Rule {
                id: "PQ001",
                category: Category::PowerQuery,
                title: "Hardcoded data source detected",
                default_severity: Severity::HIGH,
                eval: powerquery::pq001_hardcoded_source_per_query,
            },
            Rule {
                id: "PQ021",
                category: Category::PowerQuery,
                title: "Not all extracted queries appear parameterized",
                default_severity: Severity::MED,
                eval: powerquery::pq021_unparameterized,
            },
            Rule {
                id: "PQ030",
                category: Category::PowerQuery,
                title: "Potential query folding breakers detected",
                default_severity: Severity::MED,
                eval: powerquery::pq030_folding_breakers,
            },
            Rule {
                id: "PQ031",
                category: Category::PowerQuery,
                title: "Large transformation chains detected",
                default_severity: Severity::LOW,
                eval: powerquery::pq031_step_bloat,
            },
            Rule {
                id: "PQ032",
                category: Category::PowerQuery,
                title: "Filters may be applied late",
                default_severity: Severity::MED,
                eval: powerquery::pq032_late_filtering,
            },
            Rule {
                id: "PQ230",
                category: Category::PowerQuery,
                title: "Native query combined with incremental parameters",
                default_severity: Severity::HIGH,
                eval: powerquery::pq230_native_with_range,
            },
            Rule {
                id: "NC003",
                category: Category::Naming,
                title: "Query naming has bad defaults",
                default_severity: Severity::LOW,
                eval: naming::nc003_bad_query_names,
            },
            Rule {
                id: "NC010",
                category: Category::Naming,
                title: "Inconsistent table naming convention",
                default_severity: Severity::LOW,
                eval: naming::nc010_naming_outliers,
            },
            Rule {
                id: "NC011",
                category: Category::Naming,
                title: "Detected dominant table naming convention",
                default_severity: Severity::INFO,
                eval: naming::nc011_dominant_style,
            },
            Rule {
                id: "MD001",
                category: Category::Model,
                title: "Bidirectional relationship detected",
                default_severity: Severity::HIGH,
                eval: model::md001_bidirectional,
            },
            Rule {
                id: "RP002",
                category: Category::Report,
                title: "Visual overload per page",
                default_severity: Severity::MED,
                eval: report::rp002_visual_overload,
            },
        ];
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Invoke every rule in order, concatenating results.
    pub fn run_all(&self, ctx: &RuleContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            let mut emitted = (rule.eval)(ctx);
            tracing::debug!(rule = rule.id, count = emitted.len(), "rule evaluated");
            findings.append(&mut emitted);
        }
        findings
    }
}
