use crate::TOOL_NAME;
use crate::report::model::AuditReport;

/// Render a compact text view of a report. The JSON artifacts remain the
/// machine-facing contract; this is for terminals and logs.
pub fn render_text(report: &AuditReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, report.tool.version));
    out.push_str(&format!("Project: {}\n", report.project.name));
    out.push_str(&format!(
        "Tables: {}  Pages: {}  Queries: {}\n",
        report.signals.model.tables_count,
        report.signals.report.page_count,
        report.signals.power_query.count
    ));
    out.push_str(&format!(
        "Highest severity: {}\n",
        report
            .summary
            .highest_severity
            .map(|s| format!("{s:?}"))
            .unwrap_or_else(|| "NONE".to_string())
    ));
    out.push_str("Findings:\n");
    for f in &report.findings {
        out.push_str(&format!("  - {} [{:?}] {}\n", f.rule_id, f.severity, f.title));
    }
    if let Some(ai) = &report.ai_summary {
        if let Some(summary) = ai.get("summary").and_then(|v| v.as_str()) {
            if !summary.is_empty() {
                out.push_str(&format!("AI summary: {summary}\n"));
            }
        }
    }
    out
}
