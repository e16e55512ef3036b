//! Report-subtree extraction: pages, visual counts, theme presence.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;

use crate::pbip::locate::PbipContext;
use crate::pbip::read_text_lossy;

const SAMPLE_CAP: usize = 3;

/// Bounded evidence about one visual; kept for trust, not analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualSample {
    pub path: String,
    pub visual_type: String,
    pub position: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    pub page_id: String,
    /// Declared display name, falling back to the page id.
    pub display_name: String,
    pub visual_count: usize,
    pub visual_type_counts: BTreeMap<String, usize>,
    pub samples: Vec<VisualSample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportExtraction {
    pub page_count: usize,
    pub active_page_name: Option<String>,
    pub pages: Vec<ReportPage>,
    pub visual_type_counts_global: BTreeMap<String, usize>,
    /// Coarse substring check against the serialized report settings, not
    /// a schema validation.
    pub theme_present: bool,
}

/// Enumerate report pages in declaration order and count their visuals.
///
/// The pages index supplies the order; when absent or empty, page
/// directories are enumerated directly (sorted, but the order carries no
/// meaning in that fallback).
pub fn extract_report(ctx: &PbipContext) -> ReportExtraction {
    let Some(report_dir) = ctx.report_dir.as_deref() else {
        return ReportExtraction::default();
    };
    let definition = report_dir.join("definition");
    let pages_dir = definition.join("pages");

    let theme_present = read_text_lossy(&definition.join("report.json"))
        .to_lowercase()
        .contains("theme");

    let index = read_json(&pages_dir.join("pages.json"));
    let active_page_name = index
        .as_ref()
        .and_then(|v| v.get("activePageName"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut page_order: Vec<String> = index
        .as_ref()
        .and_then(|v| v.get("pageOrder"))
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if page_order.is_empty() {
        page_order = list_page_dirs(&pages_dir);
    }

    let mut pages = Vec::new();
    let mut global_counts: BTreeMap<String, usize> = BTreeMap::new();

    for page_id in page_order {
        let page = scan_page(&pages_dir.join(&page_id), &page_id);
        for (vtype, n) in &page.visual_type_counts {
            *global_counts.entry(vtype.clone()).or_default() += n;
        }
        pages.push(page);
    }

    ReportExtraction {
        page_count: pages.len(),
        active_page_name,
        pages,
        visual_type_counts_global: global_counts,
        theme_present,
    }
}

fn scan_page(page_dir: &Path, page_id: &str) -> ReportPage {
    let page_obj = read_json(&page_dir.join("page.json"));
    let display_name = page_obj
        .as_ref()
        .and_then(|obj| {
            ["displayName", "name", "title"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
        })
        .unwrap_or(page_id)
        .to_string();

    let mut visual_type_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut samples = Vec::new();
    let mut visual_count = 0usize;

    // Recursive walk tolerates nested visual groups.
    let visuals_dir = page_dir.join("visuals");
    if visuals_dir.exists() {
        for entry in WalkDir::new(&visuals_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() || entry.file_name() != "visual.json" {
                continue;
            }
            visual_count += 1;
            let obj = read_json(entry.path()).unwrap_or(Value::Null);
            let vtype = obj
                .get("visual")
                .and_then(|v| v.get("visualType"))
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            *visual_type_counts.entry(vtype.clone()).or_default() += 1;

            if samples.len() < SAMPLE_CAP {
                samples.push(VisualSample {
                    path: entry.path().display().to_string(),
                    visual_type: vtype,
                    position: obj.get("position").cloned().unwrap_or(Value::Null),
                });
            }
        }
    }

    ReportPage {
        page_id: page_id.to_string(),
        display_name,
        visual_count,
        visual_type_counts,
        samples,
    }
}

fn list_page_dirs(pages_dir: &Path) -> Vec<String> {
    let mut dirs: Vec<String> = std::fs::read_dir(pages_dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    dirs.sort();
    dirs
}

fn read_json(path: &Path) -> Option<Value> {
    let text = read_text_lossy(path);
    if text.is_empty() {
        return None;
    }
    serde_json::from_str(&text).ok()
}
