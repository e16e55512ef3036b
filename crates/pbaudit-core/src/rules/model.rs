//! Semantic-model rules.

use serde_json::json;

use crate::pbip::tables::CrossFilter;
use crate::rules::catalog::{Category, Finding, RuleContext, RuleId, Severity};

/// MD001: bidirectional cross-filtering on a relationship.
pub fn md001_bidirectional(ctx: &RuleContext) -> Vec<Finding> {
    let mut out = Vec::new();
    for rel in &ctx.inventory.model.relationships.relationships {
        if rel.cross_filtering_behavior != CrossFilter::Both {
            continue;
        }
        out.push(Finding {
            rule_id: RuleId("MD001".to_string()),
            category: Category::Model,
            severity: Severity::HIGH,
            title: "Bidirectional relationship detected".to_string(),
            message: format!(
                "{} <-> {} uses bidirectional filtering.",
                rel.from_table, rel.to_table
            ),
            recommendation: "Prefer single-direction relationships unless explicitly required."
                .to_string(),
            evidence: json!({
                "relationship": rel.id,
                "fromColumn": rel.from_column,
                "toColumn": rel.to_column,
            }),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbip::inventory::{Inventory, PathsMeta, ProjectMeta};
    use crate::pbip::tables::Relationship;
    use crate::signals::model::Signals;

    fn inventory_with(rels: Vec<Relationship>) -> Inventory {
        let mut inv = Inventory {
            project: ProjectMeta { root_dir: String::new(), name: String::new() },
            paths: PathsMeta { report_dir: String::new(), semantic_model_dir: String::new() },
            power_query: Default::default(),
            report: Default::default(),
            model: Default::default(),
        };
        inv.model.relationships.count = rels.len();
        inv.model.relationships.relationships = rels;
        inv
    }

    fn rel(id: &str, cross: CrossFilter) -> Relationship {
        Relationship {
            id: id.to_string(),
            cross_filtering_behavior: cross,
            from_column: "Sales.CustomerId".into(),
            to_column: "Customer.Id".into(),
            from_table: "Sales".into(),
            to_table: "Customer".into(),
        }
    }

    #[test]
    fn fires_once_per_bidirectional_relationship() {
        let inv = inventory_with(vec![
            rel("a", CrossFilter::SingleDirection),
            rel("b", CrossFilter::Both),
            rel("c", CrossFilter::Both),
        ]);
        let signals = Signals::default();
        let ctx = RuleContext { inventory: &inv, signals: &signals };
        let findings = md001_bidirectional(&ctx);

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == Severity::HIGH));
        assert_eq!(findings[0].evidence["relationship"], "b");
    }

    #[test]
    fn silent_without_relationships() {
        let inv = inventory_with(vec![]);
        let signals = Signals::default();
        let ctx = RuleContext { inventory: &inv, signals: &signals };
        assert!(md001_bidirectional(&ctx).is_empty());
    }
}
