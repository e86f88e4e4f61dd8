use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::commands::{CommandReport, write_csv_table};
use crate::modzip::archive::find_archives;
use crate::modzip::edit::{
    EditPlan, EditRecord, EditScope, EditStatus, Editor, ZipValidator, is_edit_output,
};

pub const LOG_HEADERS: &[&str] = &["path", "status", "out", "targets", "reason"];
pub const DEFAULT_LOG_NAME: &str = "edit_log.csv";

#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub root: PathBuf,
    pub scope: String,
    pub prefer_primary: bool,
    pub include_mod_info: bool,
    pub sets: Vec<String>,
    pub removes: Vec<String>,
    pub renames: Vec<String>,
    pub apply: bool,
    pub in_place: bool,
    pub log: Option<PathBuf>,
}

pub fn log_path(requested: &Path) -> PathBuf {
    if requested.is_dir() {
        requested.join(DEFAULT_LOG_NAME)
    } else {
        requested.to_path_buf()
    }
}

pub fn summary_line(records: &[EditRecord]) -> String {
    let count = |status: EditStatus| records.iter().filter(|r| r.status == status).count();
    format!(
        "Total: {} | edited: {} | dry-run: {} | skipped: {} | errors: {}",
        records.len(),
        count(EditStatus::Edited),
        count(EditStatus::DryRun),
        count(EditStatus::Skip),
        count(EditStatus::Error),
    )
}

fn describe(record: &EditRecord) -> String {
    let mut line = format!("{}: {}", record.status.as_str(), record.path.display());
    if let Some(out) = &record.out {
        line.push_str(&format!(" -> {}", out.display()));
    }
    if !record.targets.is_empty() {
        line.push_str(&format!(" [{}]", record.targets.join(";")));
    }
    if !record.reason.is_empty() {
        line.push_str(&format!(" ({})", record.reason));
    }
    line
}

pub fn run(opts: &EditOptions) -> Result<CommandReport> {
    let plan = EditPlan::parse(&opts.sets, &opts.removes, &opts.renames)?;
    if plan.is_empty() {
        bail!("nothing to do: pass at least one --set, --remove or --rename");
    }
    let scope = EditScope::parse(&opts.scope)?;
    if !opts.root.is_dir() {
        bail!("root directory not found: {}", opts.root.display());
    }

    let mut report = CommandReport::new("edit");
    report.detail(format!("root={}", opts.root.display()));
    report.detail(format!(
        "mode={}",
        match (opts.apply, opts.in_place) {
            (false, _) => "dry-run",
            (true, false) => "apply",
            (true, true) => "apply-in-place",
        }
    ));

    let archives: Vec<PathBuf> = find_archives(&opts.root)
        .into_iter()
        .filter(|p| !is_edit_output(p))
        .collect();
    info!(root = %opts.root.display(), archives = archives.len(), "editing metadata");

    let validator = ZipValidator::default();
    let editor = Editor {
        plan: &plan,
        scope,
        prefer_primary: opts.prefer_primary,
        include_mod_info: opts.include_mod_info,
        apply: opts.apply,
        in_place: opts.in_place,
        validator: &validator,
    };
    let records: Vec<EditRecord> = archives.iter().map(|p| editor.edit_archive(p)).collect();

    for record in &records {
        if record.status == EditStatus::Error {
            report.issue(describe(record));
        } else {
            report.detail(describe(record));
        }
    }

    if let Some(requested) = &opts.log {
        let log = log_path(requested);
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|r| {
                vec![
                    r.path.display().to_string(),
                    r.status.as_str().to_string(),
                    r.out.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
                    r.targets.join(";"),
                    r.reason.clone(),
                ]
            })
            .collect();
        write_csv_table(&log, LOG_HEADERS, &rows)?;
        report.detail(format!("log={}", log.display()));
    }

    report.detail(summary_line(&records));
    Ok(report)
}
