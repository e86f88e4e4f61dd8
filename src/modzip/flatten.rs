//! Long-form view: one pair per leaf key path of every metadata document.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::ModzipError;
use crate::modzip::archive::ModArchive;
use crate::modzip::document::Document;
use crate::modzip::scan::scan_entries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Str,
    Int,
    Float,
    Bool,
    Null,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Null => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key_path: String,
    pub value: String,
    pub value_type: ValueType,
}

/// Leaf pairs in document order. Mappings join with `.`, sequences append
/// `[i]`; empty containers contribute nothing.
pub fn flatten(doc: &Document) -> Vec<Pair> {
    let mut out = Vec::new();
    for (key, value) in doc {
        walk(key.clone(), value, &mut out);
    }
    out
}

fn walk(prefix: String, value: &Value, out: &mut Vec<Pair>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                walk(format!("{prefix}.{key}"), child, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(format!("{prefix}[{i}]"), child, out);
            }
        }
        scalar => out.push(leaf(prefix, scalar)),
    }
}

fn leaf(key_path: String, value: &Value) -> Pair {
    let (value, value_type) = match value {
        Value::String(s) => (s.clone(), ValueType::Str),
        Value::Bool(b) => (b.to_string(), ValueType::Bool),
        Value::Number(n) if n.is_f64() => (n.to_string(), ValueType::Float),
        Value::Number(n) => (n.to_string(), ValueType::Int),
        _ => (String::new(), ValueType::Null),
    };
    Pair {
        key_path,
        value,
        value_type,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPairs {
    pub info_json_path: String,
    pub pairs: Vec<Pair>,
}

/// Pairs of every non-excluded `info.json` in archive order. Unreadable
/// documents are skipped.
pub fn archive_pairs(
    path: &Path,
    exclude: &BTreeSet<String>,
) -> Result<Vec<DocumentPairs>, ModzipError> {
    let mut archive = ModArchive::open(path)?;
    let scan = scan_entries(archive.entry_names(), exclude);
    let mut out = Vec::with_capacity(scan.info_paths.len());
    for info_path in scan.info_paths {
        if let Some(doc) = archive.read_document(&info_path) {
            out.push(DocumentPairs {
                pairs: flatten(&doc),
                info_json_path: info_path,
            });
        }
    }
    Ok(out)
}

/// Key path frequency across a run.
#[derive(Debug, Default)]
pub struct KeySummary {
    keys: BTreeMap<String, (usize, BTreeSet<String>)>,
}

impl KeySummary {
    pub fn record(&mut self, key_path: &str, row_id: &str) {
        let entry = self.keys.entry(key_path.to_string()).or_default();
        entry.0 += 1;
        entry.1.insert(row_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `(key_path, count_pairs, unique_zips)` sorted by key path.
    pub fn rows(&self) -> impl Iterator<Item = (&str, usize, usize)> {
        self.keys
            .iter()
            .map(|(key, (count, zips))| (key.as_str(), *count, zips.len()))
    }
}
