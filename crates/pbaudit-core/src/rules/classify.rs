//! Summary derivation over evaluated findings.
//!
//! Responsibilities:
//! - Combine finding severities into a single headline severity
//! - Apply a transparent, deterministic policy
//! - Compute CI-compatible exit codes
//!
//! Non-responsibilities:
//! - Evaluating rule trigger conditions
//! - Mutating findings or signals
//!
//! The policy is intentionally simple and explainable:
//!
//!   - Any BLOCKER or HIGH finding → exit code 2
//!   - Else any MED finding        → exit code 1
//!   - Else                        → exit code 0
//!
//! It is deterministic and does not depend on rule evaluation order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::catalog::{Finding, Severity};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub policy: String,
    /// Highest severity across all findings; None when nothing triggered.
    pub highest_severity: Option<Severity>,
    pub severity_counts: BTreeMap<String, usize>,
    pub findings_count: usize,
    pub exit_code: i32,
}

/// Derive the run summary from evaluated findings.
///
/// Same findings input → identical summary, across repeated invocations.
pub fn classify(findings: &[Finding]) -> AuditSummary {
    let highest = findings.iter().map(|f| f.severity).max();

    let mut severity_counts: BTreeMap<String, usize> = BTreeMap::new();
    for f in findings {
        *severity_counts
            .entry(format!("{:?}", f.severity))
            .or_default() += 1;
    }

    let exit_code = match highest {
        Some(Severity::BLOCKER) | Some(Severity::HIGH) => 2,
        Some(Severity::MED) => 1,
        _ => 0,
    };

    AuditSummary {
        policy: "default".to_string(),
        highest_severity: highest,
        severity_counts,
        findings_count: findings.len(),
        exit_code,
    }
}
