//! Combined raw inventory: the immutable snapshot every later stage
//! consumes. Field order and map ordering are stable, so identical project
//! trees serialize to byte-identical JSON.

use serde::{Deserialize, Serialize};

use crate::pbip::locate::PbipContext;
use crate::pbip::pages::{ReportExtraction, extract_report};
use crate::pbip::queries::{QueryExtraction, extract_powerquery};
use crate::pbip::tables::{ModelExtraction, extract_semantic_model};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub root_dir: String,
    pub name: String,
}

/// Resolved artifact paths; empty string when the subtree is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsMeta {
    pub report_dir: String,
    pub semantic_model_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub project: ProjectMeta,
    pub paths: PathsMeta,
    pub power_query: QueryExtraction,
    pub report: ReportExtraction,
    pub model: ModelExtraction,
}

/// Run all three extractors over a resolved project.
pub fn build_inventory(ctx: &PbipContext) -> Inventory {
    Inventory {
        project: ProjectMeta {
            root_dir: ctx.project_root.display().to_string(),
            name: ctx.project_name.clone(),
        },
        paths: PathsMeta {
            report_dir: ctx
                .report_dir
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            semantic_model_dir: ctx
                .model_dir
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        },
        power_query: extract_powerquery(ctx),
        report: extract_report(ctx),
        model: extract_semantic_model(ctx),
    }
}
