//! Row builder for the one-row-per-archive table.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::ModzipError;
use crate::modzip::archive::{FileInfo, ModArchive};
use crate::modzip::config::ScanConfig;
use crate::modzip::normalize::{
    MergePolicy, NormalizedRecord, VALUE_SEPARATOR, aggregate, apply_app_aliases,
    normalize_document,
};
use crate::modzip::scan::{scan_entries, ui_name_from_app_path};
use crate::modzip::schema::{ERROR_COL, Schema};
use crate::modzip::select::{RuleTag, SelectionMode, select};
use crate::modzip::warn::{self, WarnEvent};

const PATH_LIST_SEPARATOR: &str = ";";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub path: PathBuf,
    pub fields: BTreeMap<String, String>,
}

/// Everything the row builder needs, built once per run.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub schema: Schema,
    pub exclude: BTreeSet<String>,
    pub selection_mode: SelectionMode,
    pub merge_policy: MergePolicy,
}

impl Inventory {
    pub fn new(cfg: &ScanConfig) -> Self {
        Self {
            schema: Schema::default(),
            exclude: cfg.exclude_set(),
            selection_mode: cfg.selection_mode,
            merge_policy: cfg.merge_policy,
        }
    }

    /// Never fails: a container problem lands in `zip_error` and the row
    /// keeps its file-info columns.
    pub fn inspect(&self, path: &Path) -> OutputRow {
        let mut fields = FileInfo::read(path).into_fields();
        if let Err(err) = self.fill_from_archive(path, &mut fields) {
            warn::emit(WarnEvent {
                code: err.code(),
                stage: "index",
                action: "row_error",
                archive: &path.display().to_string(),
                err: &err.cell_text(),
                ..WarnEvent::default()
            });
            fields.insert(ERROR_COL.to_string(), err.cell_text());
        }
        OutputRow {
            path: path.to_path_buf(),
            fields,
        }
    }

    fn fill_from_archive(
        &self,
        path: &Path,
        fields: &mut BTreeMap<String, String>,
    ) -> Result<(), ModzipError> {
        let mut archive = ModArchive::open(path)?;
        let scan = scan_entries(archive.entry_names(), &self.exclude);

        if let Some(name) = &scan.map_name {
            fields.insert("map_name".to_string(), name.clone());
        }
        if let Some(name) = &scan.vehicle_name {
            fields.insert("vehicle_name".to_string(), name.clone());
        }
        fields.insert("info_json_count".to_string(), scan.info_paths.len().to_string());
        fields.insert(
            "info_json_paths".to_string(),
            scan.info_paths.join(PATH_LIST_SEPARATOR),
        );
        fields.insert("app_json_count".to_string(), scan.app_paths.len().to_string());
        fields.insert(
            "app_json_paths".to_string(),
            scan.app_paths.join(PATH_LIST_SEPARATOR),
        );

        let selection = select(&scan, self.selection_mode);
        let selected: Vec<String> = selection.paths().cloned().collect();
        fields.insert("json_rule_used".to_string(), selection.rule.as_str().to_string());
        fields.insert("top_level_dir".to_string(), selection.rule.as_str().to_string());
        fields.insert("json_selected_count".to_string(), selection.len().to_string());
        fields.insert(
            "json_selected_paths".to_string(),
            selected.join(PATH_LIST_SEPARATOR),
        );

        if selection.rule == RuleTag::Ui {
            let mut names: Vec<&str> = Vec::new();
            for name in selection.app_paths.iter().filter_map(|p| ui_name_from_app_path(p)) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            fields.insert("ui_name".to_string(), names.join(VALUE_SEPARATOR));
        }

        if selection.is_empty() {
            return Ok(());
        }
        let mut records: Vec<NormalizedRecord> = Vec::with_capacity(selection.len());
        for entry in &selection.info_paths {
            if let Some(doc) = archive.read_document(entry) {
                records.push(normalize_document(&doc, &self.schema));
            }
        }
        for entry in &selection.app_paths {
            if let Some(doc) = archive.read_document(entry) {
                records.push(normalize_document(&apply_app_aliases(&doc), &self.schema));
            }
        }
        fields.extend(aggregate(&records, self.merge_policy));
        Ok(())
    }
}
