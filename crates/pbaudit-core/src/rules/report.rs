//! Report-layout rules.

use serde_json::json;

use crate::rules::catalog::{Category, Finding, RuleContext, RuleId, Severity};

pub(crate) const VISUALS_HIGH: usize = 20;
pub(crate) const VISUALS_MED: usize = 14;

/// RP002: visual overload per page.
pub fn rp002_visual_overload(ctx: &RuleContext) -> Vec<Finding> {
    let mut out = Vec::new();
    for page in &ctx.inventory.report.pages {
        let severity = if page.visual_count >= VISUALS_HIGH {
            Severity::HIGH
        } else if page.visual_count >= VISUALS_MED {
            Severity::MED
        } else {
            continue;
        };
        out.push(Finding {
            rule_id: RuleId("RP002".to_string()),
            category: Category::Report,
            severity,
            title: "Visual overload per page".to_string(),
            message: format!(
                "Page '{}' contains {} visuals.",
                page.display_name, page.visual_count
            ),
            recommendation: "Split into drill-through/tooltip pages or reduce visuals for \
                             performance/readability."
                .to_string(),
            evidence: json!({
                "page": page.display_name,
                "visualCount": page.visual_count,
            }),
        });
    }
    out
}
