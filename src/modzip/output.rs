use anyhow::{Context, Result};
use fs2::FileExt;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A CSV table plus its JSONL sidecar, both held under an exclusive lock
/// until [`TableSink::finish`]. Only the coordinating thread writes here.
pub struct TableSink {
    csv_path: PathBuf,
    sidecar_path: PathBuf,
    csv: csv::Writer<File>,
    sidecar: BufWriter<File>,
    csv_lock: File,
    sidecar_lock: File,
    sidecar_lines: usize,
}

pub fn create_locked(path: &Path) -> Result<(File, File)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    FileExt::lock_exclusive(&file)
        .with_context(|| format!("failed to lock {}", path.display()))?;
    let handle = file
        .try_clone()
        .with_context(|| format!("failed to reopen {}", path.display()))?;
    Ok((file, handle))
}

impl TableSink {
    pub fn create(csv_path: &Path, sidecar_path: &Path) -> Result<Self> {
        let (csv_file, csv_lock) = create_locked(csv_path)?;
        let (sidecar_file, sidecar_lock) = create_locked(sidecar_path)?;
        Ok(Self {
            csv_path: csv_path.to_path_buf(),
            sidecar_path: sidecar_path.to_path_buf(),
            csv: csv::Writer::from_writer(csv_file),
            sidecar: BufWriter::new(sidecar_file),
            csv_lock,
            sidecar_lock,
            sidecar_lines: 0,
        })
    }

    pub fn write_row<I, S>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.csv
            .write_record(cells)
            .with_context(|| format!("failed to write {}", self.csv_path.display()))
    }

    pub fn write_sidecar<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.sidecar, "{line}")
            .with_context(|| format!("failed to write {}", self.sidecar_path.display()))?;
        self.sidecar_lines += 1;
        Ok(())
    }

    pub fn sidecar_lines(&self) -> usize {
        self.sidecar_lines
    }

    pub fn finish(mut self) -> Result<()> {
        self.csv
            .flush()
            .with_context(|| format!("failed to flush {}", self.csv_path.display()))?;
        self.sidecar
            .flush()
            .with_context(|| format!("failed to flush {}", self.sidecar_path.display()))?;
        let _ = FileExt::unlock(&self.csv_lock);
        let _ = FileExt::unlock(&self.sidecar_lock);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn sink_writes_both_files_and_creates_parents() {
        let tmp = tempdir().expect("tempdir");
        let csv_path = tmp.path().join("out/nested/t.csv");
        let sidecar_path = tmp.path().join("out/nested/t.details.jsonl");

        let mut sink = TableSink::create(&csv_path, &sidecar_path).expect("create");
        sink.write_row(["a", "b"]).expect("header");
        sink.write_row(["1", "x, y"]).expect("row");
        sink.write_sidecar(&BTreeMap::from([("row_id", "r1")]))
            .expect("sidecar");
        assert_eq!(sink.sidecar_lines(), 1);
        sink.finish().expect("finish");

        let csv_text = fs::read_to_string(&csv_path).expect("read csv");
        assert_eq!(csv_text, "a,b\n1,\"x, y\"\n");
        let jsonl = fs::read_to_string(&sidecar_path).expect("read sidecar");
        assert_eq!(jsonl, "{\"row_id\":\"r1\"}\n");
    }
}
