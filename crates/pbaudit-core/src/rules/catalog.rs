use serde::{Deserialize, Serialize};

use crate::pbip::inventory::Inventory;
use crate::signals::model::Signals;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Severity ladder. Declaration order is the total order used for ranking:
/// INFO < LOW < MED < HIGH < BLOCKER.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    INFO,
    LOW,
    MED,
    HIGH,
    BLOCKER,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    PowerQuery,
    Model,
    Report,
    Naming,
    DataValidation,
}

/// One severity-tagged diagnostic emitted by a rule.
///
/// Findings are append-only output: a rule never sees or modifies another
/// rule's findings. Evidence is bounded by the emitting rule and never
/// carries a full source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "id")]
    pub rule_id: RuleId,
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub recommendation: String,
    pub evidence: serde_json::Value,
}

/// Read-only evaluation context handed to every rule.
///
/// Both fields are immutable snapshots; absence of a facet shows up as the
/// facet's default value, never as a missing field.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub inventory: &'a Inventory,
    pub signals: &'a Signals,
}

/// A rule is data: identity plus a pure evaluation function. The rule set
/// is closed and known at build time, so no dynamic dispatch is needed.
pub struct Rule {
    pub id: &'static str,
    pub category: Category,
    pub title: &'static str,
    pub default_severity: Severity,
    pub eval: fn(&RuleContext) -> Vec<Finding>,
}
