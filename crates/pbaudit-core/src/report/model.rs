use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::SCHEMA_VERSION;
use crate::pbip::inventory::Inventory;
use crate::rules::catalog::Finding;
use crate::rules::classify::AuditSummary;
use crate::signals::model::Signals;
use crate::util::deterministic::sort_findings;

/// Top-level audit report.
///
/// This struct is the stable JSON contract of a run. It must remain
/// deterministic for identical project trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub project: ProjectInfo,
    pub analysis: AnalysisInfo,
    pub signals: Signals,
    pub findings: Vec<Finding>,
    pub summary: AuditSummary,
    /// AI-generated summary object; present only when the AI stage ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<serde_json::Value>,
}

impl AuditReport {
    /// Assemble a report from pipeline outputs.
    ///
    /// Findings are sorted here (severity first, then rule id) so callers
    /// never have to care about rule evaluation order.
    pub fn new(
        tool: ToolInfo,
        project: ProjectInfo,
        analysis: AnalysisInfo,
        signals: Signals,
        mut findings: Vec<Finding>,
        summary: AuditSummary,
    ) -> Self {
        sort_findings(&mut findings);
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            project,
            analysis,
            signals,
            findings,
            summary,
            ai_summary: None,
        }
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub commit: Option<String>,
}

/// Project metadata bound to this report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: String,
    pub root_dir: String,
    pub report_dir: Option<String>,
    pub model_dir: Option<String>,
    pub fingerprint: Fingerprint,
}

/// Cryptographic identity of the extracted inventory.
///
/// The fingerprint depends only on extraction output, so two runs over an
/// unchanged project tree carry the same value regardless of timestamps
/// or filesystem metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fingerprint {
    pub algorithm: String,
    pub value: String,
}

/// Fingerprint the canonical inventory JSON.
pub fn fingerprint_inventory(inventory: &Inventory) -> Fingerprint {
    let bytes = serde_json::to_vec(inventory).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Fingerprint {
        algorithm: "sha256".to_string(),
        value: hex::encode(hasher.finalize()),
    }
}

/// Extraction status for the run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisInfo {
    pub status: String,
    pub warnings: Vec<String>,
}

impl AnalysisInfo {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
            warnings: vec![],
        }
    }

    /// Extraction completed but one or more subtrees were absent.
    pub fn degraded(warnings: Vec<String>) -> Self {
        Self {
            status: "degraded".into(),
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbip::inventory::{PathsMeta, ProjectMeta};
    use crate::rules::catalog::{Category, RuleId, Severity};
    use crate::rules::classify::classify;
    use serde_json::json;

    fn empty_inventory() -> Inventory {
        Inventory {
            project: ProjectMeta { root_dir: "demo".into(), name: "demo".into() },
            paths: PathsMeta { report_dir: String::new(), semantic_model_dir: String::new() },
            power_query: Default::default(),
            report: Default::default(),
            model: Default::default(),
        }
    }

    fn dummy_findings() -> Vec<Finding> {
        vec![
            Finding {
                rule_id: RuleId("NC011".into()),
                category: Category::Naming,
                severity: Severity::INFO,
                title: "t".into(),
                message: "m".into(),
                recommendation: "r".into(),
                evidence: json!({}),
            },
            Finding {
                rule_id: RuleId("PQ020".into()),
                category: Category::PowerQuery,
                severity: Severity::HIGH,
                title: "t".into(),
                message: "m".into(),
                recommendation: "r".into(),
                evidence: json!({}),
            },
        ]
    }

    fn project_info() -> ProjectInfo {
        ProjectInfo {
            name: "demo".into(),
            root_dir: "demo".into(),
            report_dir: None,
            model_dir: None,
            fingerprint: fingerprint_inventory(&empty_inventory()),
        }
    }

    #[test]
    fn report_sorts_findings_by_severity() {
        let findings = dummy_findings();
        let summary = classify(&findings);
        let report = AuditReport::new(
            ToolInfo { name: "pbaudit".into(), version: "0.1.0".into(), commit: None },
            project_info(),
            AnalysisInfo::ok(),
            Signals::default(),
            findings,
            summary,
        );

        assert_eq!(report.findings[0].rule_id.as_str(), "PQ020");
        assert_eq!(report.findings[1].rule_id.as_str(), "NC011");
        assert_eq!(report.summary.exit_code, 2);
    }

    #[test]
    fn fingerprint_is_stable_and_input_sensitive() {
        let a = fingerprint_inventory(&empty_inventory());
        let b = fingerprint_inventory(&empty_inventory());
        assert_eq!(a, b);
        assert_eq!(a.algorithm, "sha256");
        assert_eq!(a.value.len(), 64);

        let mut changed = empty_inventory();
        changed.project.name = "other".into();
        assert_ne!(fingerprint_inventory(&changed).value, a.value);
    }

    #[test]
    fn ai_summary_is_omitted_from_json_when_absent() {
        let report = AuditReport::new(
            ToolInfo { name: "pbaudit".into(), version: "0.1.0".into(), commit: None },
            project_info(),
            AnalysisInfo::ok(),
            Signals::default(),
            vec![],
            classify(&[]),
        );
        let v = serde_json::to_value(&report).unwrap();
        assert!(v.get("ai_summary").is_none());
        assert_eq!(v["schema_version"], SCHEMA_VERSION);
    }

    #[test]
    fn analysis_info_factories() {
        let ok = AnalysisInfo::ok();
        assert_eq!(ok.status, "ok");
        assert!(ok.warnings.is_empty());

        let degraded = AnalysisInfo::degraded(vec!["no report subtree".into()]);
        assert_eq!(degraded.status, "degraded");
        assert_eq!(degraded.warnings.len(), 1);
    }
}
