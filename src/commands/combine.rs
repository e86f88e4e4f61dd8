use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::modzip::combine::{CombineOptions, combine};

#[derive(Debug, Clone)]
pub struct CombineCommandOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub combine: CombineOptions,
}

pub fn run(opts: &CombineCommandOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("combine");
    report.detail(format!("input={}", opts.input.display()));
    report.detail(format!("output={}", opts.output.display()));
    report.detail(format!("include={}", opts.combine.includes.join(",")));
    report.detail(format!("exclude={}", opts.combine.excludes.join(",")));

    let summary = combine(&opts.input, &opts.output, &opts.combine)?;
    report.detail(format!("files_found={}", summary.files_found));
    for skipped in &summary.skipped {
        report.detail(format!("skipped_headerless={}", skipped.display()));
    }
    report.detail(format!("columns={}", summary.headers.len()));
    report.detail(format!("rows={}", summary.rows));
    Ok(report)
}
