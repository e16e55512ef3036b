//! Deterministic ordering helpers.
//!
//! These utilities enforce the stable ordering guarantees of the report
//! schema. All ordering here is semantic and intentional, ensuring
//! identical inputs always produce identical outputs.

use crate::rules::catalog::Finding;

/// Sort findings by severity (highest first), then by rule id.
///
/// This ordering is part of the report contract and must not change
/// without a schema version bump.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::{Category, RuleId, Severity};
    use serde_json::json;

    fn f(id: &str, sev: Severity) -> Finding {
        Finding {
            rule_id: RuleId(id.to_string()),
            category: Category::PowerQuery,
            severity: sev,
            title: "t".into(),
            message: "m".into(),
            recommendation: "r".into(),
            evidence: json!({}),
        }
    }

    #[test]
    fn severity_ranks_before_rule_id() {
        let mut findings = vec![
            f("NC011", Severity::INFO),
            f("PQ020", Severity::HIGH),
            f("PQ031", Severity::LOW),
            f("MD001", Severity::HIGH),
            f("PQ021", Severity::MED),
        ];
        sort_findings(&mut findings);

        let ids: Vec<&str> = findings.iter().map(|x| x.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["MD001", "PQ020", "PQ021", "PQ031", "NC011"]);

        let severities: Vec<Severity> = findings.iter().map(|x| x.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(severities, sorted);
    }

    #[test]
    fn sorting_is_deterministic_across_runs() {
        let make = || {
            vec![
                f("PQ030", Severity::MED),
                f("PQ000", Severity::HIGH),
                f("RP002", Severity::MED),
            ]
        };
        let mut first = make();
        let mut second = make();
        sort_findings(&mut first);
        sort_findings(&mut second);

        let ids = |v: &[Finding]| v.iter().map(|x| x.rule_id.0.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(ids(&first), vec!["PQ000", "PQ030", "RP002"]);
    }
}
