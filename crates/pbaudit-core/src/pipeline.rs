//! End-to-end audit pipeline.
//!
//! locate → extract → signals → rules → classify → report. Each stage
//! consumes an immutable snapshot from the previous one; nothing writes
//! back. Artifact persistence is ordered so that a root-not-found failure
//! writes nothing, while an AI-stage failure happens after every core
//! artifact is already on disk.

use std::path::Path;

use anyhow::{Context, Result};

use crate::ai::summary::AiClient;
use crate::pbip::inventory::{Inventory, build_inventory};
use crate::pbip::locate::load_pbip;
use crate::report::model::{
    AnalysisInfo, AuditReport, ProjectInfo, ToolInfo, fingerprint_inventory,
};
use crate::report::render::render_text;
use crate::rules::catalog::RuleContext;
use crate::rules::classify::classify;
use crate::rules::registry::RuleRegistry;
use crate::signals::build::build_signals;

#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Directory for JSON/text artifacts; nothing is written when unset.
    pub out_dir: Option<std::path::PathBuf>,
    /// Run the AI summarization stage after core artifacts are persisted.
    pub run_ai: bool,
}

/// Run a full audit over a PBIP project path (root folder or manifest).
pub fn audit(project_path: &Path, tool: ToolInfo, opts: &AuditOptions) -> Result<AuditReport> {
    let ctx = load_pbip(project_path)?;
    tracing::info!(project = %ctx.project_name, "starting audit");

    let inventory = build_inventory(&ctx);
    let signals = build_signals(&inventory);

    let registry = RuleRegistry::default_catalog();
    let findings = registry.run_all(&RuleContext {
        inventory: &inventory,
        signals: &signals,
    });
    let summary = classify(&findings);
    tracing::info!(
        findings = findings.len(),
        exit_code = summary.exit_code,
        "rule evaluation complete"
    );

    let mut report = AuditReport::new(
        tool,
        project_info(&ctx, &inventory),
        analysis_for(&ctx),
        signals,
        findings,
        summary,
    );

    if let Some(out_dir) = opts.out_dir.as_deref() {
        write_core_artifacts(out_dir, &inventory, &report)?;
    }

    if opts.run_ai {
        let client = AiClient::from_env()?;
        let ai = client.generate_summary(&report.signals, &report.findings)?;
        if let Some(out_dir) = opts.out_dir.as_deref() {
            write_json(&out_dir.join("ai_summary.json"), &ai)?;
        }
        report.ai_summary = Some(ai);
    }

    Ok(report)
}

fn project_info(ctx: &crate::pbip::locate::PbipContext, inventory: &Inventory) -> ProjectInfo {
    ProjectInfo {
        name: ctx.project_name.clone(),
        root_dir: ctx.project_root.display().to_string(),
        report_dir: ctx.report_dir.as_deref().map(|p| p.display().to_string()),
        model_dir: ctx.model_dir.as_deref().map(|p| p.display().to_string()),
        fingerprint: fingerprint_inventory(inventory),
    }
}

fn analysis_for(ctx: &crate::pbip::locate::PbipContext) -> AnalysisInfo {
    let mut warnings = Vec::new();
    if ctx.report_dir.is_none() {
        warnings.push("no report subtree (*.Report) found".to_string());
    }
    if ctx.model_dir.is_none() {
        warnings.push("no semantic-model subtree (*.SemanticModel) found".to_string());
    }
    if warnings.is_empty() {
        AnalysisInfo::ok()
    } else {
        AnalysisInfo::degraded(warnings)
    }
}

fn write_core_artifacts(out_dir: &Path, inventory: &Inventory, report: &AuditReport) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir: {}", out_dir.display()))?;
    write_json(&out_dir.join("inventory.json"), inventory)?;
    write_json(&out_dir.join("signals.json"), &report.signals)?;
    write_json(&out_dir.join("findings.json"), &report.findings)?;
    std::fs::write(out_dir.join("report.txt"), render_text(report))
        .context("failed to write report.txt")?;
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
