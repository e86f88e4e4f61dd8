use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::commands::{CommandReport, write_csv_table};
use crate::commands::index::Progress;
use crate::error::ModzipError;
use crate::modzip::archive::{FileInfo, find_archives};
use crate::modzip::cells::sanitize_cell;
use crate::modzip::config::{ConfigOverrides, load_config};
use crate::modzip::flatten::{DocumentPairs, KeySummary, archive_pairs};
use crate::modzip::notify::completion_notice;
use crate::modzip::output::TableSink;
use crate::modzip::paths::{key_summary_path, output_path, sidecar_path};
use crate::modzip::warn::{self, WarnEvent};

pub const OUTPUT_PREFIX: &str = "allpairs";
pub const HEADERS: &[&str] = &[
    "row_id",
    "file_path",
    "info_json_path",
    "key_path",
    "value",
    "value_type",
];
pub const SUMMARY_HEADERS: &[&str] = &["key_path", "count_pairs", "unique_zips"];

#[derive(Debug, Clone, Default)]
pub struct PairsOptions {
    pub root: PathBuf,
    pub output: Option<PathBuf>,
    pub out_base_dir: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

/// Sidecar line for one cut value.
#[derive(Debug, Serialize)]
struct PairTruncation<'a> {
    row_id: &'a str,
    file_path: &'a str,
    info_json_path: &'a str,
    key_path: &'a str,
    full: &'a str,
    length: usize,
}

struct ArchivePairs {
    info: FileInfo,
    docs: Result<Vec<DocumentPairs>, ModzipError>,
}

pub fn run(opts: &PairsOptions) -> Result<CommandReport> {
    let cfg = load_config(&opts.overrides)?;
    if !opts.root.is_dir() {
        bail!("root directory not found: {}", opts.root.display());
    }

    let output = output_path(
        &opts.root,
        opts.output.as_deref(),
        opts.out_base_dir.as_deref(),
        OUTPUT_PREFIX,
    );
    let sidecar = sidecar_path(&output);
    let summary_path = key_summary_path(&opts.root, &output, opts.output.is_some());
    let mut report = CommandReport::new("pairs");
    report.detail(format!("root={}", opts.root.display()));
    report.detail(format!("output={}", output.display()));
    report.detail(format!("sidecar={}", sidecar.display()));
    report.detail(format!("key_summary={}", summary_path.display()));
    report.detail(format!("workers={}", cfg.run.workers));
    report.detail(format!("notify={}", cfg.run.notify.as_str()));

    let archives = find_archives(&opts.root);
    info!(root = %opts.root.display(), archives = archives.len(), "dumping key paths");

    let exclude = cfg.scan.exclude_set();
    let progress = Progress::new(archives.len(), cfg.run.progress_every);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.run.workers)
        .build()
        .context("failed to start worker pool")?;
    let results: Vec<ArchivePairs> = pool.install(|| {
        archives
            .par_iter()
            .map(|path| {
                let result = ArchivePairs {
                    info: FileInfo::read(path),
                    docs: archive_pairs(path, &exclude),
                };
                progress.tick();
                result
            })
            .collect()
    });

    let mut sink = TableSink::create(&output, &sidecar)?;
    sink.write_row(HEADERS)?;
    let mut keys = KeySummary::default();
    let mut pair_count = 0usize;
    let mut errors = 0usize;
    for item in &results {
        let info = &item.info;
        let docs = match &item.docs {
            Ok(docs) => docs,
            Err(err) => {
                errors += 1;
                warn::emit(WarnEvent {
                    code: err.code(),
                    stage: "pairs",
                    action: "archive_skipped",
                    archive: &info.file_path,
                    err: &err.cell_text(),
                    ..WarnEvent::default()
                });
                report.issue(format!("{}: {}", info.file_path, err.cell_text()));
                continue;
            }
        };
        for doc in docs {
            for pair in &doc.pairs {
                let cell = sanitize_cell(&pair.value, cfg.scan.max_cell_chars);
                sink.write_row([
                    info.row_id.as_str(),
                    info.file_path.as_str(),
                    doc.info_json_path.as_str(),
                    pair.key_path.as_str(),
                    cell.text.as_str(),
                    pair.value_type.as_str(),
                ])?;
                if let Some((full, length)) = &cell.truncated {
                    sink.write_sidecar(&PairTruncation {
                        row_id: &info.row_id,
                        file_path: &info.file_path,
                        info_json_path: &doc.info_json_path,
                        key_path: &pair.key_path,
                        full,
                        length: *length,
                    })?;
                }
                keys.record(&pair.key_path, &info.row_id);
                pair_count += 1;
            }
        }
    }
    if keys.is_empty() {
        info!("no key paths found");
    }
    let truncated = sink.sidecar_lines();
    sink.finish()?;
    write_key_summary(&summary_path, &keys)?;

    let summary = vec![
        format!("archives={}", results.len()),
        format!("pairs={pair_count}"),
        format!("distinct_keys={}", keys.len()),
        format!("errors={errors}"),
        format!("truncated_values={truncated}"),
        format!("elapsed_secs={:.2}", progress.elapsed_secs()),
    ];
    for line in &summary {
        report.detail(line.clone());
    }
    completion_notice(cfg.run.notify, "modzip pairs", &summary);
    Ok(report)
}

fn write_key_summary(path: &Path, keys: &KeySummary) -> Result<()> {
    let rows: Vec<Vec<String>> = keys
        .rows()
        .map(|(key, count, zips)| vec![key.to_string(), count.to_string(), zips.to_string()])
        .collect();
    write_csv_table(path, SUMMARY_HEADERS, &rows)
}
