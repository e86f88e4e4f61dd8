use anyhow::{Result, bail};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

use crate::commands::{CommandReport, write_csv_table};
use crate::modzip::archive::find_archives;
use crate::modzip::edit::is_edit_output;
use crate::modzip::rename::{RenameRecord, RenameStatus, rename_archive};

pub const LOG_HEADERS: &[&str] = &["status", "path", "to", "reason"];

#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    pub root: PathBuf,
    pub apply: bool,
    pub log: Option<PathBuf>,
}

fn describe(record: &RenameRecord) -> String {
    match (&record.to, record.reason.is_empty()) {
        (Some(to), true) => format!(
            "{}: {} -> {}",
            record.status.as_str(),
            record.path.display(),
            to.display()
        ),
        _ => format!(
            "{}: {} ({})",
            record.status.as_str(),
            record.path.display(),
            record.reason
        ),
    }
}

pub fn summary_line(records: &[RenameRecord]) -> String {
    let count = |status: RenameStatus| records.iter().filter(|r| r.status == status).count();
    format!(
        "Total: {} | renamed: {} | dry-run: {} | skipped: {} | errors: {}",
        records.len(),
        count(RenameStatus::Renamed),
        count(RenameStatus::DryRun),
        count(RenameStatus::Skip),
        count(RenameStatus::Error),
    )
}

pub fn run(opts: &RenameOptions) -> Result<CommandReport> {
    if !opts.root.is_dir() {
        bail!("root directory not found: {}", opts.root.display());
    }
    let mut report = CommandReport::new("rename");
    report.detail(format!("root={}", opts.root.display()));
    report.detail(format!("mode={}", if opts.apply { "apply" } else { "dry-run" }));

    let archives: Vec<PathBuf> = find_archives(&opts.root)
        .into_iter()
        .filter(|p| !is_edit_output(p))
        .collect();
    info!(root = %opts.root.display(), archives = archives.len(), "planning renames");

    let mut claimed = BTreeSet::new();
    let records: Vec<RenameRecord> = archives
        .iter()
        .map(|path| rename_archive(path, opts.apply, &mut claimed))
        .collect();

    for record in &records {
        if record.status == RenameStatus::Error {
            report.issue(describe(record));
        } else {
            report.detail(describe(record));
        }
    }

    if let Some(log) = &opts.log {
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|r| {
                vec![
                    r.status.as_str().to_string(),
                    r.path.display().to_string(),
                    r.to.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
                    r.reason.clone(),
                ]
            })
            .collect();
        write_csv_table(log, LOG_HEADERS, &rows)?;
        report.detail(format!("log={}", log.display()));
    }

    report.detail(summary_line(&records));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: RenameStatus) -> RenameRecord {
        RenameRecord {
            status,
            path: PathBuf::from("a.zip"),
            to: None,
            reason: String::new(),
        }
    }

    #[test]
    fn summary_counts_each_status() {
        let records = vec![
            record(RenameStatus::DryRun),
            record(RenameStatus::DryRun),
            record(RenameStatus::Skip),
            record(RenameStatus::Unchanged),
            record(RenameStatus::Error),
        ];
        assert_eq!(
            summary_line(&records),
            "Total: 5 | renamed: 0 | dry-run: 2 | skipped: 1 | errors: 1"
        );
    }
}
