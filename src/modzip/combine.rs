//! Union of several CSV tables into one, with a stable header order.

use anyhow::{Context, Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::modzip::output::create_locked;

pub const DEFAULT_INCLUDE: &[&str] = &["mods_index_on_*.csv", "allpairs_on_*.csv", "*.csv"];
pub const DEFAULT_EXCLUDE: &[&str] = &["*keys_summary*.csv"];
pub const SOURCE_COL: &str = "source_file";

pub const PREFERRED_FIRST: &[&str] = &[
    "row_id",
    "file_path",
    "directory",
    "file_name",
    "file_size_bytes",
    "date_created",
    "date_modified",
    "top_level_dir",
    "map_name",
    "vehicle_name",
    "info_json_count",
    "info_json_paths",
    "authors",
    "last_update_human",
    "resource_date_human",
    "message",
    "zip_error",
];

#[derive(Debug, Clone)]
pub struct CombineOptions {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub add_source_col: bool,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            includes: DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect(),
            excludes: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            add_source_col: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CombineSummary {
    pub files_found: usize,
    pub skipped: Vec<PathBuf>,
    pub rows: usize,
    pub headers: Vec<String>,
}

/// Shell-style wildcard match (`*`, `?`), ASCII case-insensitive.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let t: Vec<char> = text.to_lowercase().chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}

pub fn find_csv_files(root: &Path, includes: &[String], excludes: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            includes.iter().any(|pat| wildcard_match(pat, &name))
                && !excludes.iter().any(|pat| wildcard_match(pat, &name))
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// UTF-8 (BOM stripped) or, failing that, Latin-1.
fn decode_text(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(text) => text.to_string(),
        Err(_) => raw.iter().map(|b| char::from(*b)).collect(),
    }
}

struct Table {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

/// `None` for an empty or headerless file.
fn read_table(path: &Path) -> Result<Option<Table>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = decode_text(&raw);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to parse header of {}", path.display()))?
        .iter()
        .map(ToOwned::to_owned)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Ok(None);
    }
    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(Table { headers, rows }))
}

pub fn header_order(all: &BTreeSet<String>) -> Vec<String> {
    let mut ordered: Vec<String> = PREFERRED_FIRST
        .iter()
        .filter(|h| all.contains(**h))
        .map(|h| h.to_string())
        .collect();
    ordered.extend(
        all.iter()
            .filter(|h| !PREFERRED_FIRST.contains(&h.as_str()))
            .cloned(),
    );
    ordered
}

pub fn combine(root: &Path, output: &Path, opts: &CombineOptions) -> Result<CombineSummary> {
    let output_abs = std::path::absolute(output).unwrap_or_else(|_| output.to_path_buf());
    let files: Vec<PathBuf> = find_csv_files(root, &opts.includes, &opts.excludes)
        .into_iter()
        .filter(|p| std::path::absolute(p).map_or(true, |abs| abs != output_abs))
        .collect();
    if files.is_empty() {
        bail!("no CSV files matching the include patterns under {}", root.display());
    }

    let mut summary = CombineSummary {
        files_found: files.len(),
        ..CombineSummary::default()
    };
    let mut tables: Vec<(PathBuf, Table)> = Vec::with_capacity(files.len());
    let mut all_headers = BTreeSet::new();
    for path in files {
        match read_table(&path)? {
            Some(table) => {
                all_headers.extend(table.headers.iter().cloned());
                tables.push((path, table));
            }
            None => {
                info!(path = %path.display(), "skipping headerless CSV");
                summary.skipped.push(path);
            }
        }
    }
    if tables.is_empty() {
        bail!("no readable CSVs with headers under {}", root.display());
    }
    if opts.add_source_col {
        all_headers.insert(SOURCE_COL.to_string());
    }
    summary.headers = header_order(&all_headers);

    let (file, lock) = create_locked(output)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&summary.headers)?;
    for (path, table) in &tables {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        for record in &table.rows {
            let mut row: BTreeMap<&str, &str> = table
                .headers
                .iter()
                .map(String::as_str)
                .zip(record.iter())
                .collect();
            if opts.add_source_col {
                row.insert(SOURCE_COL, &source);
            }
            writer.write_record(
                summary
                    .headers
                    .iter()
                    .map(|h| row.get(h.as_str()).copied().unwrap_or_default()),
            )?;
            summary.rows += 1;
        }
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", output.display()))?;
    let _ = fs2::FileExt::unlock(&lock);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn wildcards_are_case_insensitive() {
        assert!(wildcard_match("mods_index_on_*.csv", "MODS_INDEX_ON_D.CSV"));
        assert!(wildcard_match("*keys_summary*.csv", "keys_summary_on_C.csv"));
        assert!(wildcard_match("a?c", "abc"));
        assert!(!wildcard_match("*.csv", "notes.txt"));
        assert!(wildcard_match("*", ""));
    }

    #[test]
    fn latin1_fallback_and_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFa,b"), "a,b");
        assert_eq!(decode_text(b"caf\xE9"), "café");
    }

    #[test]
    fn unions_headers_in_preferred_order() {
        let tmp = tempdir().expect("tempdir");
        let input = tmp.path().join("in");
        fs::create_dir_all(input.join("sub")).expect("mkdir");
        fs::write(input.join("mods_index_on_C.csv"), "file_name,row_id,zeta\nA.zip,r1,z\n")
            .expect("write");
        fs::write(input.join("sub/allpairs_on_D.csv"), "\u{feff}row_id,alpha\nr2,a\n")
            .expect("write");
        fs::write(input.join("keys_summary_on_C.csv"), "key_path,count_pairs\nx,1\n")
            .expect("write");
        fs::write(input.join("empty.csv"), "").expect("write");

        let output = tmp.path().join("combined.csv");
        let opts = CombineOptions {
            add_source_col: true,
            ..CombineOptions::default()
        };
        let summary = combine(&input, &output, &opts).expect("combine");
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(
            summary.headers,
            vec!["row_id", "file_name", "alpha", "source_file", "zeta"]
        );

        let text = fs::read_to_string(&output).expect("read");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "row_id,file_name,alpha,source_file,zeta");
        assert_eq!(lines[1], "r1,A.zip,,mods_index_on_C.csv,z");
        assert_eq!(lines[2], "r2,,a,allpairs_on_D.csv,");
    }

    #[test]
    fn nothing_to_combine_is_an_error() {
        let tmp = tempdir().expect("tempdir");
        let err = combine(tmp.path(), &tmp.path().join("out.csv"), &CombineOptions::default())
            .expect_err("must fail");
        assert!(err.to_string().contains("no CSV files"));
    }
}
