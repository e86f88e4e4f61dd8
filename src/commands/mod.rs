pub mod combine;
pub mod edit;
pub mod index;
pub mod pairs;
pub mod rename;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::modzip::output::create_locked;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    /// Plain-text form printed on stdout.
    pub fn render(&self) -> String {
        let mut out = format!(
            "command={} ok={}\n",
            self.command,
            if self.ok { "true" } else { "false" }
        );
        for detail in &self.details {
            out.push_str(detail);
            out.push('\n');
        }
        for issue in &self.issues {
            out.push_str("issue: ");
            out.push_str(issue);
            out.push('\n');
        }
        out
    }
}

/// Small locked CSV: run logs and the key summary.
pub(crate) fn write_csv_table(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let (file, lock) = create_locked(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(header)
        .with_context(|| format!("failed to write {}", path.display()))?;
    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    let _ = fs2::FileExt::unlock(&lock);
    Ok(())
}
