pub mod ai;
pub mod error;
pub mod pbip;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod signals;
pub mod util;

pub const TOOL_NAME: &str = "pbaudit";

/// JSON schema version of pbaudit reports.
/// This must be bumped only when the report contract changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";

pub const RULE_CATALOG_VERSION: &str = "0.1.0";

pub use pipeline::{AuditOptions, audit};
