use std::path::PathBuf;

use thiserror::Error;

/// Fatal failure modes of an audit run.
///
/// Everything else degrades: unreadable or missing definition files yield
/// empty facets instead of errors, so one malformed file never suppresses
/// the rest of the report.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The given project path does not resolve to a PBIP project at all.
    /// Raised before any artifact is written.
    #[error("PBIP path not found: {path}")]
    ProjectNotFound { path: PathBuf },

    /// AI summarization was requested but the required credential is absent.
    /// Raised after core artifacts are persisted; only the AI stage aborts.
    #[error("missing credential: environment variable {var} is not set")]
    MissingCredential { var: &'static str },
}
