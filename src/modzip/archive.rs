use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::ModzipError;
use crate::modzip::document::{Document, parse_document_detailed};
use crate::modzip::normalize::HUMAN_FORMAT;
use crate::modzip::scan::normalize_entry_path;

pub const ARCHIVE_EXTENSION: &str = "zip";
const ROW_ID_HEX_LEN: usize = 12;

/// An opened mod archive with its entry names normalized once up front.
pub struct ModArchive {
    path: PathBuf,
    inner: ZipArchive<BufReader<File>>,
    entries: Vec<String>,
}

impl ModArchive {
    pub fn open(path: &Path) -> Result<Self, ModzipError> {
        let file = File::open(path)?;
        let inner = ZipArchive::new(BufReader::new(file))?;
        let entries = (0..inner.len())
            .map(|i| {
                inner
                    .name_for_index(i)
                    .map(normalize_entry_path)
                    .unwrap_or_default()
            })
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            inner,
            entries,
        })
    }

    /// Normalized entry names in archive order.
    pub fn entry_names(&self) -> &[String] {
        &self.entries
    }

    pub fn index_of(&self, normalized: &str) -> Option<usize> {
        self.entries.iter().position(|name| name == normalized)
    }

    pub fn read_entry(&mut self, normalized: &str) -> Result<Vec<u8>, ModzipError> {
        let index = self
            .index_of(normalized)
            .ok_or_else(|| ModzipError::from(zip::result::ZipError::FileNotFound))?;
        let mut entry = self.inner.by_index(index)?;
        let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read and tolerantly parse one entry. `None` when the entry itself
    /// cannot be read; an unparseable entry yields an empty document.
    pub fn read_document(&mut self, normalized: &str) -> Option<Document> {
        match self.read_entry(normalized) {
            Ok(raw) => {
                let outcome = parse_document_detailed(&raw);
                if !outcome.recovered() {
                    debug!(archive = %self.path.display(), entry = normalized, "metadata unparseable, treated as empty");
                }
                Some(outcome.document)
            }
            Err(err) => {
                debug!(archive = %self.path.display(), entry = normalized, error = %err, "entry unreadable");
                None
            }
        }
    }
}

/// Every archive under `root`, sorted.
pub fn find_archives(root: &Path) -> Vec<PathBuf> {
    let mut archives: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    archives.sort();
    archives
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub row_id: String,
    pub directory: String,
    pub file_name: String,
    pub file_path: String,
    pub size_bytes: u64,
    pub created: String,
    pub modified: String,
}

impl FileInfo {
    /// Filesystem facts for one archive. Missing metadata degrades to
    /// zero size and empty timestamps.
    pub fn read(path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let meta = fs::metadata(path).ok();
        let size_bytes = meta.as_ref().map(|m| m.len()).unwrap_or(0);
        let created = meta.as_ref().and_then(|m| m.created().ok());
        let modified = meta.as_ref().and_then(|m| m.modified().ok());
        let mtime_secs = modified.map(epoch_secs).unwrap_or(0);

        Self {
            row_id: row_identifier(&absolute, size_bytes, mtime_secs),
            directory: path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            file_path: path.display().to_string(),
            size_bytes,
            created: created.map(format_system_time).unwrap_or_default(),
            modified: modified.map(format_system_time).unwrap_or_default(),
        }
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("row_id".to_string(), self.row_id),
            ("directory".to_string(), self.directory),
            ("file_name".to_string(), self.file_name),
            ("file_path".to_string(), self.file_path),
            ("file_size_bytes".to_string(), self.size_bytes.to_string()),
            ("date_created".to_string(), self.created),
            ("date_modified".to_string(), self.modified),
        ])
    }
}

fn epoch_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

pub fn format_system_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HUMAN_FORMAT).to_string()
}

/// Short fingerprint of absolute path, size and whole-second mtime. Stable
/// across runs as long as the file is untouched.
pub fn row_identifier(absolute_path: &Path, size_bytes: u64, mtime_secs: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(absolute_path.to_string_lossy().as_bytes());
    hasher.update(b"|");
    hasher.update(size_bytes.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(mtime_secs.to_string().as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(ROW_ID_HEX_LEN);
    hex
}

/// Rename with a copy+remove fallback for cross-device moves.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if matches!(rename_err.kind(), ErrorKind::CrossesDevices) {
                fs::copy(from, to).with_context(|| {
                    format!("failed to copy {} to {}", from.display(), to.display())
                })?;
                fs::remove_file(from)
                    .with_context(|| format!("failed to remove {}", from.display()))?;
                Ok(())
            } else {
                Err(rename_err).with_context(|| {
                    format!("failed to move {} to {}", from.display(), to.display())
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;

    /// Write a deflated zip holding `entries` in the given order.
    pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).expect("create zip");
        let mut writer = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            writer.start_file(*name, options).expect("start entry");
            writer.write_all(data).expect("write entry");
        }
        writer.finish().expect("finish zip");
    }
}
