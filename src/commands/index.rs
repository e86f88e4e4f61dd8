use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::info;

use crate::commands::CommandReport;
use crate::modzip::archive::find_archives;
use crate::modzip::cells::sanitize_row;
use crate::modzip::config::{ConfigOverrides, load_config};
use crate::modzip::inventory::{Inventory, OutputRow};
use crate::modzip::notify::completion_notice;
use crate::modzip::output::TableSink;
use crate::modzip::paths::{output_path, sidecar_path};
use crate::modzip::schema::ERROR_COL;

pub const OUTPUT_PREFIX: &str = "mods_index";

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub root: PathBuf,
    pub output: Option<PathBuf>,
    pub out_base_dir: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

pub(crate) struct Progress {
    total: usize,
    every: usize,
    done: AtomicUsize,
    started: Instant,
}

impl Progress {
    pub(crate) fn new(total: usize, every: usize) -> Self {
        Self {
            total,
            every,
            done: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    pub(crate) fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.every == 0 || (done % self.every != 0 && done != self.total) {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { done as f64 / elapsed } else { 0.0 };
        info!("Processed {done}/{} ({rate:.1} zips/s)", self.total);
    }

    pub(crate) fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

pub fn run(opts: &IndexOptions) -> Result<CommandReport> {
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
    let mut report = CommandReport::new("index");
    report.detail(format!("root={}", opts.root.display()));
    report.detail(format!("output={}", output.display()));
    report.detail(format!("sidecar={}", sidecar.display()));
    report.detail(format!("selection_mode={}", cfg.scan.selection_mode.as_str()));
    report.detail(format!("merge_policy={}", cfg.scan.merge_policy.as_str()));
    report.detail(format!("workers={}", cfg.run.workers));
    report.detail(format!("notify={}", cfg.run.notify.as_str()));

    let archives = find_archives(&opts.root);
    info!(root = %opts.root.display(), archives = archives.len(), "indexing");

    let inventory = Inventory::new(&cfg.scan);
    let progress = Progress::new(archives.len(), cfg.run.progress_every);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.run.workers)
        .build()
        .context("failed to start worker pool")?;
    let mut rows: Vec<OutputRow> = pool.install(|| {
        archives
            .par_iter()
            .map(|path| {
                let row = inventory.inspect(path);
                progress.tick();
                row
            })
            .collect()
    });
    rows.sort_by(|a, b| a.path.cmp(&b.path));

    let headers = inventory
        .schema
        .determine_headers(rows.iter().flat_map(|row| row.fields.keys()));
    let mut sink = TableSink::create(&output, &sidecar)?;
    sink.write_row(&headers)?;
    let mut errors = 0usize;
    for row in &rows {
        let (cells, truncation) = sanitize_row(&headers, &row.fields, cfg.scan.max_cell_chars);
        sink.write_row(&cells)?;
        if !truncation.is_empty() {
            sink.write_sidecar(&truncation)?;
        }
        if let Some(err) = row.fields.get(ERROR_COL) {
            errors += 1;
            report.issue(format!("{}: {err}", row.path.display()));
        }
    }
    let truncated_rows = sink.sidecar_lines();
    sink.finish()?;

    let summary = vec![
        format!("archives={}", rows.len()),
        format!("errors={errors}"),
        format!("truncated_rows={truncated_rows}"),
        format!("columns={}", headers.len()),
        format!("elapsed_secs={:.2}", progress.elapsed_secs()),
    ];
    for line in &summary {
        report.detail(line.clone());
    }
    completion_notice(cfg.run.notify, "modzip index", &summary);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_counts_every_tick() {
        let progress = Progress::new(3, 0);
        progress.tick();
        progress.tick();
        assert_eq!(progress.done.load(Ordering::Relaxed), 2);
    }
}
