//! Canonical file names for vehicle and map archives.
//!
//! Vehicles: `[vehicle][car][{brand}][{body}] {name}{version}.zip`
//! Maps: `[map][{category}] {title}{version}.zip`

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ModzipError;
use crate::modzip::archive::ModArchive;
use crate::modzip::document::Document;
use crate::modzip::scan::{Compartment, compartment_of, is_info_document};

const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const UNKNOWN: &str = "Unknown";
const DEFAULT_CATEGORY: &str = "fictional";
const RACE_TRACK_WORDS: &[&str] = &["track", "raceway", "speedway", "circuit", "motorspeedway"];
const OFFROAD_WORDS: &[&str] = &["trail", "overland", "rock", "mud", "offroad", "off-road"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModKind {
    Vehicle,
    Map,
}

/// First vehicles document wins; levels only when there is no vehicle.
pub fn find_kind_and_info<I, S>(names: I) -> Option<(ModKind, String)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut level: Option<String> = None;
    for name in names {
        let path = name.as_ref();
        if !is_info_document(path) || !path.contains('/') {
            continue;
        }
        match compartment_of(path) {
            Compartment::Vehicles => return Some((ModKind::Vehicle, path.to_string())),
            Compartment::Levels if level.is_none() => level = Some(path.to_string()),
            _ => {}
        }
    }
    level.map(|path| (ModKind::Map, path))
}

/// First non-empty textual value among `keys`.
fn first_text(doc: &Document, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| doc.get(*key))
        .filter_map(|value| match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

pub fn sanitize_component(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ` v1.2` style token from the current name, else `version_string`,
/// else nothing. The result carries its leading space.
pub fn guess_version(current_name: &str, doc: &Document) -> String {
    if let Some(token) = version_token(current_name) {
        return format!(" {token}");
    }
    match doc.get("version_string") {
        Some(Value::String(v)) if !v.trim().is_empty() => {
            let v = v.trim();
            if v.to_ascii_lowercase().starts_with('v') {
                format!(" {v}")
            } else {
                format!(" v{v}")
            }
        }
        _ => String::new(),
    }
}

/// Leftmost `<space>v<digits>(.<digits>)*` in `name`.
fn version_token(name: &str) -> Option<&str> {
    let bytes = name.as_bytes();
    for start in 1..bytes.len() {
        if !bytes[start - 1].is_ascii_whitespace() || !matches!(bytes[start], b'v' | b'V') {
            continue;
        }
        let mut end = start + 1;
        let digits = count_digits(&bytes[end..]);
        if digits == 0 {
            continue;
        }
        end += digits;
        while end < bytes.len() && bytes[end] == b'.' {
            let more = count_digits(&bytes[end + 1..]);
            if more == 0 {
                break;
            }
            end += 1 + more;
        }
        return name.get(start..end);
    }
    None
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

pub fn map_category(doc: &Document) -> String {
    for key in ["category_title", "tag_line"] {
        if let Some(Value::String(v)) = doc.get(key) {
            if !v.trim().is_empty() {
                return v.trim().to_lowercase();
            }
        }
    }
    let blob = ["title", "description", "message"]
        .iter()
        .map(|key| match doc.get(*key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if RACE_TRACK_WORDS.iter().any(|w| blob.contains(w)) {
        return "race track".to_string();
    }
    if OFFROAD_WORDS.iter().any(|w| blob.contains(w)) {
        return "offroad".to_string();
    }
    DEFAULT_CATEGORY.to_string()
}

pub fn plan_file_name(
    kind: ModKind,
    doc: &Document,
    current_name: &str,
) -> Result<String, ModzipError> {
    let version = guess_version(current_name, doc);
    match kind {
        ModKind::Vehicle => {
            let name = sanitize_component(&first_text(doc, &["Name", "title"]));
            if name.is_empty() {
                return Err(ModzipError::InsufficientMetadata(
                    "vehicle has no Name".to_string(),
                ));
            }
            let brand = or_unknown(sanitize_component(&first_text(doc, &["Brand", "brand"])));
            let body = or_unknown(sanitize_component(&first_text(
                doc,
                &["Body Style", "body_style", "BodyStyle"],
            )));
            Ok(format!("[vehicle][car][{brand}][{body}] {name}{version}.zip"))
        }
        ModKind::Map => {
            let title = sanitize_component(&first_text(doc, &["title", "Name"]));
            if title.is_empty() {
                return Err(ModzipError::InsufficientMetadata(
                    "map has no title".to_string(),
                ));
            }
            let category = sanitize_component(&map_category(doc));
            Ok(format!("[map][{category}] {title}{version}.zip"))
        }
    }
}

fn or_unknown(value: String) -> String {
    if value.is_empty() {
        UNKNOWN.to_string()
    } else {
        value
    }
}

pub fn plan_archive(path: &Path) -> Result<String, ModzipError> {
    let mut archive = ModArchive::open(path)?;
    let (kind, info_path) =
        find_kind_and_info(archive.entry_names()).ok_or(ModzipError::NoMetadata)?;
    let doc = archive.read_document(&info_path).unwrap_or_default();
    let current = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    plan_file_name(kind, &doc, &current)
}

/// `target`, or `<stem> (n).<ext>` for the smallest free n >= 2. Paths in
/// `claimed` count as taken so a dry run predicts what an apply run does.
/// `current`, the archive being renamed, always counts as free.
pub fn next_free_path(target: &Path, current: &Path, claimed: &BTreeSet<PathBuf>) -> PathBuf {
    let taken = |p: &Path| p != current && (p.exists() || claimed.contains(p));
    if !taken(target) {
        return target.to_path_buf();
    }
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 2usize;
    loop {
        let candidate = target.with_file_name(format!("{stem} ({n}){ext}"));
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameStatus {
    Renamed,
    DryRun,
    Skip,
    Error,
    Unchanged,
}

impl RenameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Renamed => "renamed",
            Self::DryRun => "dry-run",
            Self::Skip => "skip",
            Self::Error => "error",
            Self::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    pub status: RenameStatus,
    pub path: PathBuf,
    pub to: Option<PathBuf>,
    pub reason: String,
}

impl RenameRecord {
    fn new(status: RenameStatus, path: &Path, to: Option<PathBuf>, reason: String) -> Self {
        Self {
            status,
            path: path.to_path_buf(),
            to,
            reason,
        }
    }
}

/// Plan and optionally apply one rename. Never fails; problems become the
/// record's status and reason.
pub fn rename_archive(path: &Path, apply: bool, claimed: &mut BTreeSet<PathBuf>) -> RenameRecord {
    let planned = match plan_archive(path) {
        Ok(name) => name,
        Err(err @ ModzipError::Container { .. }) => {
            return RenameRecord::new(RenameStatus::Error, path, None, err.cell_text());
        }
        Err(err) => return RenameRecord::new(RenameStatus::Skip, path, None, err.to_string()),
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let first_choice = dir.join(&planned);
    let target = next_free_path(&first_choice, path, claimed);
    claimed.insert(target.clone());
    if target == path {
        return RenameRecord::new(RenameStatus::Unchanged, path, Some(target), String::new());
    }

    if !apply {
        return RenameRecord::new(RenameStatus::DryRun, path, Some(target), String::new());
    }
    match fs::rename(path, &target)
        .with_context(|| format!("failed to rename {} to {}", path.display(), target.display()))
    {
        Ok(()) => RenameRecord::new(RenameStatus::Renamed, path, Some(target), String::new()),
        Err(err) => RenameRecord::new(RenameStatus::Error, path, Some(target), format!("{err:#}")),
    }
}
