use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::AuditError;

/// Resolved PBIP project layout.
///
/// `project_root` is always a directory. The report and semantic-model
/// subtrees are optional: their absence is a valid (if empty) project, not
/// an error, and downstream extractors yield empty facets for a missing
/// subtree.
#[derive(Debug, Clone)]
pub struct PbipContext {
    pub project_root: PathBuf,
    /// The `.pbip` manifest file, when present. Informational only; it is
    /// used to derive a display name and never parsed.
    pub pbip_file: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
    pub project_name: String,
}

/// Resolve a PBIP project from either its root folder or the `.pbip`
/// manifest file inside it.
///
/// Subtree discovery is one level deep: the first (sorted) child directory
/// whose name ends with `.Report` and the first ending with
/// `.SemanticModel` are taken.
pub fn load_pbip(project_path: &Path) -> Result<PbipContext> {
    let (project_root, pbip_file, project_name) = if project_path.is_file()
        && project_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pbip"))
    {
        let root = project_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = file_stem(project_path);
        (root, Some(project_path.to_path_buf()), name)
    } else if project_path.is_dir() {
        let root = project_path.to_path_buf();
        let manifest = first_manifest(&root);
        let name = manifest
            .as_deref()
            .map(file_stem)
            .unwrap_or_else(|| dir_name(&root));
        (root, manifest, name)
    } else {
        return Err(AuditError::ProjectNotFound {
            path: project_path.to_path_buf(),
        }
        .into());
    };

    let mut report_dir = None;
    let mut model_dir = None;
    for child in sorted_children(&project_root) {
        if !child.is_dir() {
            continue;
        }
        let name = dir_name(&child);
        if report_dir.is_none() && name.ends_with(".Report") {
            report_dir = Some(child.clone());
        }
        if model_dir.is_none() && name.ends_with(".SemanticModel") {
            model_dir = Some(child.clone());
        }
    }

    tracing::debug!(
        root = %project_root.display(),
        has_report = report_dir.is_some(),
        has_model = model_dir.is_some(),
        "resolved PBIP project"
    );

    Ok(PbipContext {
        project_root,
        pbip_file,
        report_dir,
        model_dir,
        project_name,
    })
}

fn first_manifest(root: &Path) -> Option<PathBuf> {
    sorted_children(root).into_iter().find(|p| {
        p.is_file()
            && p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pbip"))
    })
}

/// Children in sorted name order, so subtree discovery does not depend on
/// filesystem iteration order.
fn sorted_children(dir: &Path) -> Vec<PathBuf> {
    let mut children: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|rd| rd.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    children.sort();
    children
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
