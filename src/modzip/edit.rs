//! Field edits on metadata documents inside archives.
//!
//! The original archive is never opened for writing. A replacement is built
//! in a temp file next to it, validated, persisted as `<stem>.edited.zip`,
//! and only then optionally swapped in (original kept as `<name>.zip.bak`).

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ModzipError;
use crate::modzip::archive::{ModArchive, move_file};
use crate::modzip::document::Document;
use crate::modzip::scan::{Compartment, compartment_of, is_info_document, normalize_entry_path};
use crate::modzip::warn::{self, WarnEvent};

pub const EDITED_SUFFIX: &str = ".edited.zip";
pub const BACKUP_SUFFIX: &str = ".bak";
const VALIDATION_SAMPLE: usize = 5;

/// Dot-path operations, applied per document as renames, then sets, then
/// removes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditPlan {
    pub renames: Vec<(String, String)>,
    pub sets: Vec<(String, Value)>,
    pub removes: Vec<String>,
}

impl EditPlan {
    pub fn parse(sets: &[String], removes: &[String], renames: &[String]) -> Result<Self, ModzipError> {
        let mut plan = Self::default();
        for raw in renames {
            let (from, to) = raw
                .split_once(':')
                .ok_or_else(|| ModzipError::InvalidFieldOp(format!("--rename needs old:new, got: {raw}")))?;
            plan.renames.push((checked_path(from, raw)?, checked_path(to, raw)?));
        }
        for raw in sets {
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| ModzipError::InvalidFieldOp(format!("--set needs key=value, got: {raw}")))?;
            plan.sets.push((checked_path(key, raw)?, parse_value(value)));
        }
        for raw in removes {
            plan.removes.push(checked_path(raw, raw)?);
        }
        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.sets.is_empty() && self.removes.is_empty()
    }

    /// Apply every operation to `doc`. Returns the dot paths of
    /// intermediate values that were replaced by a fresh mapping.
    pub fn apply(&self, doc: &mut Document) -> Vec<String> {
        let mut overwritten = Vec::new();
        for (from, to) in &self.renames {
            overwritten.extend(rename_path(doc, from, to));
        }
        for (key, value) in &self.sets {
            overwritten.extend(set_path(doc, key, value.clone()));
        }
        for key in &self.removes {
            remove_path(doc, key);
        }
        overwritten
    }
}

fn checked_path(path: &str, raw: &str) -> Result<String, ModzipError> {
    let path = path.trim();
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(ModzipError::InvalidFieldOp(format!("empty key in: {raw}")));
    }
    Ok(path.to_string())
}

fn looks_like_json(s: &str) -> bool {
    s.starts_with('{')
        || s.starts_with('[')
        || matches!(s.to_ascii_lowercase().as_str(), "true" | "false" | "null")
        || is_plain_number(s)
}

fn is_plain_number(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

/// JSON when it looks like JSON, then a lenient JSON5 attempt, else the
/// trimmed text as a string.
pub fn parse_value(raw: &str) -> Value {
    let s = raw.trim();
    if !looks_like_json(s) {
        return Value::String(s.to_string());
    }
    serde_json::from_str(s)
        .or_else(|_| json5::from_str::<Value>(s))
        .unwrap_or_else(|_| Value::String(s.to_string()))
}

/// Walks (creating as needed) the parents of `path`. A parent that exists
/// but is not a mapping is replaced with an empty one; its dot path is
/// pushed onto `overwritten`.
fn parent_mut<'a>(
    root: &'a mut Document,
    parents: &[&str],
    overwritten: &mut Vec<String>,
) -> Option<&'a mut Document> {
    let mut cur = root;
    for (depth, key) in parents.iter().enumerate() {
        let slot = cur
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            overwritten.push(parents[..=depth].join("."));
            *slot = Value::Object(Map::new());
        }
        cur = slot.as_object_mut()?;
    }
    Some(cur)
}

pub fn set_path(root: &mut Document, path: &str, value: Value) -> Vec<String> {
    let parts: Vec<&str> = path.split('.').collect();
    let Some((leaf, parents)) = parts.split_last() else {
        return Vec::new();
    };
    let mut overwritten = Vec::new();
    if let Some(parent) = parent_mut(root, parents, &mut overwritten) {
        parent.insert((*leaf).to_string(), value);
    }
    overwritten
}

fn existing_parent_mut<'a>(root: &'a mut Document, parents: &[&str]) -> Option<&'a mut Document> {
    let mut cur = root;
    for key in parents {
        cur = cur.get_mut(*key)?.as_object_mut()?;
    }
    Some(cur)
}

pub fn remove_path(root: &mut Document, path: &str) -> Option<Value> {
    let parts: Vec<&str> = path.split('.').collect();
    let (leaf, parents) = parts.split_last()?;
    existing_parent_mut(root, parents)?.shift_remove(*leaf)
}

/// Moves the value at `from` to `to`; a missing source is a no-op.
pub fn rename_path(root: &mut Document, from: &str, to: &str) -> Vec<String> {
    match remove_path(root, from) {
        Some(value) => set_path(root, to, value),
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditScope {
    pub vehicles: bool,
    pub levels: bool,
    pub mod_info: bool,
}

impl EditScope {
    pub fn parse(raw: &str) -> Result<Self, ModzipError> {
        let raw = raw.trim().to_ascii_lowercase();
        if raw == "all" {
            return Ok(Self {
                vehicles: true,
                levels: true,
                mod_info: true,
            });
        }
        let mut scope = Self {
            vehicles: false,
            levels: false,
            mod_info: false,
        };
        for part in raw.split(',').map(str::trim) {
            match part {
                "vehicles" => scope.vehicles = true,
                "levels" => scope.levels = true,
                "mod_info" => scope.mod_info = true,
                _ => {}
            }
        }
        if !(scope.vehicles || scope.levels || scope.mod_info) {
            return Err(ModzipError::InvalidConfig(format!(
                "empty scope `{raw}`: use vehicles, levels, mod_info or all"
            )));
        }
        Ok(scope)
    }

    fn allows(&self, compartment: &Compartment) -> bool {
        match compartment {
            Compartment::Vehicles => self.vehicles,
            Compartment::Levels => self.levels,
            Compartment::ModInfo => self.mod_info,
            _ => false,
        }
    }
}

/// Documents to edit, in archive order within each group, each once.
pub fn filter_scope(
    info_paths: &[String],
    scope: EditScope,
    prefer_primary: bool,
    include_mod_info: bool,
) -> Vec<String> {
    let in_compartment = |c: Compartment| -> Vec<&String> {
        info_paths.iter().filter(|p| compartment_of(p) == c).collect()
    };
    let vehicles = in_compartment(Compartment::Vehicles);
    let levels = in_compartment(Compartment::Levels);
    let mod_info = in_compartment(Compartment::ModInfo);

    let mut chosen: Vec<&String> = Vec::new();
    if prefer_primary && !(vehicles.is_empty() && levels.is_empty()) {
        let (primary, compartment) = if vehicles.is_empty() {
            (&levels, Compartment::Levels)
        } else {
            (&vehicles, Compartment::Vehicles)
        };
        if scope.allows(&compartment) {
            chosen.extend(primary.iter().copied());
        }
        if include_mod_info && scope.mod_info {
            chosen.extend(mod_info.iter().copied());
        }
    } else {
        if scope.vehicles {
            chosen.extend(vehicles.iter().copied());
        }
        if scope.levels {
            chosen.extend(levels.iter().copied());
        }
        if scope.mod_info {
            chosen.extend(mod_info.iter().copied());
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(chosen.len());
    for path in chosen {
        if !out.contains(path) {
            out.push(path.clone());
        }
    }
    out
}

/// Post-build check on a rewritten archive.
pub trait ArchiveCheck: Sync {
    fn check(&self, path: &Path) -> Result<(), ModzipError>;
}

#[derive(Debug, Clone, Copy)]
pub struct ZipValidator {
    pub sample_entries: usize,
}

impl Default for ZipValidator {
    fn default() -> Self {
        Self {
            sample_entries: VALIDATION_SAMPLE,
        }
    }
}

impl ArchiveCheck for ZipValidator {
    fn check(&self, path: &Path) -> Result<(), ModzipError> {
        let file = File::open(path)
            .map_err(|err| ModzipError::Validation(format!("open failed: {err}")))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|err| ModzipError::Validation(format!("open failed: {err}")))?;
        if archive.is_empty() {
            return Err(ModzipError::Validation("empty zip".to_string()));
        }
        for i in 0..archive.len().min(self.sample_entries) {
            let mut entry = archive
                .by_index(i)
                .map_err(|err| ModzipError::Validation(format!("failed to read entry {i}: {err}")))?;
            let name = entry.name().to_string();
            io::copy(&mut entry, &mut io::sink()).map_err(|err| {
                ModzipError::Validation(format!("failed to read entry '{name}': {err}"))
            })?;
        }
        Ok(())
    }
}

/// Copy every entry of `source` verbatim except the ones in `edits`, which
/// are written as pretty-printed UTF-8 JSON. The result lives in a temp
/// file in `dir` and disappears if dropped.
pub fn build_edited_archive(
    source: &Path,
    edits: &BTreeMap<String, Document>,
    dir: &Path,
) -> Result<NamedTempFile> {
    let input = File::open(source).with_context(|| format!("failed to open {}", source.display()))?;
    let mut src = ZipArchive::new(BufReader::new(input))
        .with_context(|| format!("failed to read {}", source.display()))?;
    let staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;

    let mut writer = ZipWriter::new(staged.as_file());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for i in 0..src.len() {
        let entry = src.by_index_raw(i)?;
        let Some(doc) = edits.get(&normalize_entry_path(entry.name())) else {
            writer.raw_copy_file(entry)?;
            continue;
        };
        let name = entry.name().to_string();
        drop(entry);
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&serde_json::to_vec_pretty(doc)?)?;
    }
    writer
        .finish()
        .with_context(|| format!("failed to finish archive built from {}", source.display()))?;
    Ok(staged)
}

/// `<stem>.edited.zip` files are outputs of an earlier edit run.
pub fn is_edit_output(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(EDITED_SUFFIX))
}

pub fn edited_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    original.with_file_name(format!("{stem}{EDITED_SUFFIX}"))
}

pub fn backup_path(original: &Path) -> PathBuf {
    let mut name = original.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// original -> .bak, edited -> original. A failed second move puts the
/// original back.
pub fn swap_in_place(original: &Path, edited: &Path) -> Result<PathBuf> {
    let backup = backup_path(original);
    if backup.exists() {
        fs::remove_file(&backup)
            .with_context(|| format!("failed to remove old backup {}", backup.display()))?;
    }
    move_file(original, &backup)?;
    if let Err(err) = move_file(edited, original) {
        return match move_file(&backup, original) {
            Ok(()) => Err(err),
            Err(restore_err) => Err(anyhow!(
                "{err:#}; restoring {} from {} also failed: {restore_err:#}",
                original.display(),
                backup.display()
            )),
        };
    }
    Ok(backup)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStatus {
    DryRun,
    Edited,
    Skip,
    Error,
}

impl EditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DryRun => "dry-run",
            Self::Edited => "edited",
            Self::Skip => "skip",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub path: PathBuf,
    pub status: EditStatus,
    pub out: Option<PathBuf>,
    pub targets: Vec<String>,
    pub reason: String,
}

pub struct Editor<'a> {
    pub plan: &'a EditPlan,
    pub scope: EditScope,
    pub prefer_primary: bool,
    pub include_mod_info: bool,
    pub apply: bool,
    pub in_place: bool,
    pub validator: &'a dyn ArchiveCheck,
}

impl Editor<'_> {
    /// Never fails; problems end up in the record.
    pub fn edit_archive(&self, path: &Path) -> EditRecord {
        let mut record = EditRecord {
            path: path.to_path_buf(),
            status: EditStatus::Error,
            out: None,
            targets: Vec::new(),
            reason: String::new(),
        };
        match self.try_edit(path, &mut record) {
            Ok(status) => record.status = status,
            Err(err) => {
                record.status = EditStatus::Error;
                record.reason = match err.downcast_ref::<ModzipError>() {
                    Some(domain) => domain.cell_text(),
                    None => format!("{err:#}"),
                };
                warn::emit(WarnEvent {
                    code: err.downcast_ref::<ModzipError>().map_or("E_EDIT", ModzipError::code),
                    stage: "edit",
                    action: "original_untouched",
                    archive: &path.display().to_string(),
                    err: &record.reason,
                    ..WarnEvent::default()
                });
            }
        }
        record
    }

    fn try_edit(&self, path: &Path, record: &mut EditRecord) -> Result<EditStatus> {
        let mut archive = ModArchive::open(path)?;
        let info_paths: Vec<String> = archive
            .entry_names()
            .iter()
            .filter(|p| is_info_document(p))
            .cloned()
            .collect();
        record.targets = filter_scope(&info_paths, self.scope, self.prefer_primary, self.include_mod_info);
        if record.targets.is_empty() {
            record.reason = "no targets in scope".to_string();
            return Ok(EditStatus::Skip);
        }
        if !self.apply {
            return Ok(EditStatus::DryRun);
        }

        let mut edits = BTreeMap::new();
        for target in &record.targets {
            let mut doc = archive.read_document(target).unwrap_or_default();
            for overwritten in self.plan.apply(&mut doc) {
                warn::emit(WarnEvent {
                    code: "W_OVERWRITE",
                    stage: "edit",
                    action: "replaced_with_mapping",
                    archive: &path.display().to_string(),
                    reason: target,
                    err: &overwritten,
                });
            }
            edits.insert(target.clone(), doc);
        }
        drop(archive);

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let staged = build_edited_archive(path, &edits, dir)?;
        self.validator.check(staged.path())?;

        let edited = edited_path(path);
        staged
            .persist(&edited)
            .map_err(|err| err.error)
            .with_context(|| format!("failed to write {}", edited.display()))?;

        if self.in_place {
            swap_in_place(path, &edited)?;
            record.out = Some(path.to_path_buf());
        } else {
            record.out = Some(edited);
        }
        Ok(EditStatus::Edited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modzip::archive::test_support::write_zip;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    struct RejectAll;

    impl ArchiveCheck for RejectAll {
        fn check(&self, _path: &Path) -> Result<(), ModzipError> {
            Err(ModzipError::Validation("rejected".to_string()))
        }
    }

    fn plan(sets: &[&str], removes: &[&str], renames: &[&str]) -> EditPlan {
        let own = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        EditPlan::parse(&own(sets), &own(removes), &own(renames)).expect("plan")
    }

    #[test]
    fn edited_copies_are_recognised() {
        assert!(is_edit_output(Path::new("/m/car.edited.zip")));
        assert!(is_edit_output(Path::new("/m/CAR.EDITED.ZIP")));
        assert!(!is_edit_output(Path::new("/m/car.zip")));
        assert!(is_edit_output(&edited_path(Path::new("/m/car.zip"))));
    }

    #[test]
    fn values_parse_as_json_json5_or_text() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value(" true "), json!(true));
        assert_eq!(parse_value("[1, 2]"), json!([1, 2]));
        assert_eq!(parse_value("{a: 1,}"), json!({"a": 1}));
        assert_eq!(parse_value("offroad"), json!("offroad"));
        assert_eq!(parse_value("{broken"), json!("{broken"));
    }

    #[test]
    fn set_creates_and_overwrites_intermediates() {
        let mut d = doc(json!({"a": 5}));
        let overwritten = set_path(&mut d, "a.b.c", json!("x"));
        assert_eq!(overwritten, vec!["a"]);
        assert_eq!(Value::Object(d), json!({"a": {"b": {"c": "x"}}}));
    }

    #[test]
    fn remove_and_rename_walk_existing_paths_only() {
        let mut d = doc(json!({"meta": {"old": 1, "keep": 2}, "flat": "v"}));
        assert_eq!(remove_path(&mut d, "missing.key"), None);
        assert!(rename_path(&mut d, "meta.old", "info.new").is_empty());
        assert!(rename_path(&mut d, "nope", "x").is_empty());
        assert_eq!(
            Value::Object(d),
            json!({"meta": {"keep": 2}, "flat": "v", "info": {"new": 1}})
        );
    }

    #[test]
    fn operations_run_renames_then_sets_then_removes() {
        let p = plan(&["title=New"], &["title"], &["title:old_title"]);
        let mut d = doc(json!({"title": "Old"}));
        p.apply(&mut d);
        assert_eq!(Value::Object(d), json!({"old_title": "Old"}));
    }

    #[test]
    fn malformed_operations_are_rejected() {
        let own = |s: &str| vec![s.to_string()];
        assert!(EditPlan::parse(&own("novalue"), &[], &[]).is_err());
        assert!(EditPlan::parse(&[], &[], &own("nocolon")).is_err());
        assert!(EditPlan::parse(&[], &own("a..b"), &[]).is_err());
    }

    #[test]
    fn scope_filtering() {
        let paths: Vec<String> = [
            "mod_info/M/info.json",
            "levels/utah/info.json",
            "vehicles/covet/info.json",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let all = EditScope::parse("all").expect("scope");

        assert_eq!(
            filter_scope(&paths, all, false, false),
            vec!["vehicles/covet/info.json", "levels/utah/info.json", "mod_info/M/info.json"]
        );
        assert_eq!(
            filter_scope(&paths, all, true, false),
            vec!["vehicles/covet/info.json"]
        );
        assert_eq!(
            filter_scope(&paths, all, true, true),
            vec!["vehicles/covet/info.json", "mod_info/M/info.json"]
        );
        let levels_only = EditScope::parse("levels").expect("scope");
        assert!(filter_scope(&paths, levels_only, true, false).is_empty());
        assert!(EditScope::parse("scripts").is_err());
    }

    #[test]
    fn apply_builds_validated_edited_copy() {
        let tmp = tempdir().expect("tempdir");
        let zip_path = tmp.path().join("utah.zip");
        write_zip(
            &zip_path,
            &[
                ("levels/utah/info.json", br#"{"title": "Utah", "authors": "A",}"#),
                ("levels/utah/main.level.json", b"{}"),
            ],
        );
        let original = fs::read(&zip_path).expect("read");
        let p = plan(&["map_category=offroad"], &["authors"], &[]);
        let validator = ZipValidator::default();
        let editor = Editor {
            plan: &p,
            scope: EditScope::parse("levels").expect("scope"),
            prefer_primary: false,
            include_mod_info: false,
            apply: true,
            in_place: false,
            validator: &validator,
        };

        let record = editor.edit_archive(&zip_path);
        assert_eq!(record.status, EditStatus::Edited, "{}", record.reason);
        let edited = tmp.path().join("utah.edited.zip");
        assert_eq!(record.out.as_deref(), Some(edited.as_path()));
        assert_eq!(fs::read(&zip_path).expect("read"), original);

        let mut out = ModArchive::open(&edited).expect("open edited");
        assert_eq!(out.entry_names().len(), 2);
        let d = out.read_document("levels/utah/info.json").expect("doc");
        assert_eq!(Value::Object(d), json!({"title": "Utah", "map_category": "offroad"}));
        let raw = out.read_entry("levels/utah/info.json").expect("raw");
        assert!(String::from_utf8(raw).expect("utf8").contains("\n  \"title\""));
    }

    #[test]
    fn in_place_keeps_backup() {
        let tmp = tempdir().expect("tempdir");
        let zip_path = tmp.path().join("car.zip");
        write_zip(&zip_path, &[("vehicles/car/info.json", br#"{"Name": "Car"}"#)]);
        let original = fs::read(&zip_path).expect("read");
        fs::write(backup_path(&zip_path), b"stale").expect("stale backup");

        let p = plan(&["Brand=Gavril"], &[], &[]);
        let validator = ZipValidator::default();
        let editor = Editor {
            plan: &p,
            scope: EditScope::parse("all").expect("scope"),
            prefer_primary: true,
            include_mod_info: false,
            apply: true,
            in_place: true,
            validator: &validator,
        };
        let record = editor.edit_archive(&zip_path);
        assert_eq!(record.status, EditStatus::Edited, "{}", record.reason);
        assert_eq!(fs::read(backup_path(&zip_path)).expect("bak"), original);
        assert!(!tmp.path().join("car.edited.zip").exists());

        let mut swapped = ModArchive::open(&zip_path).expect("open");
        let d = swapped.read_document("vehicles/car/info.json").expect("doc");
        assert_eq!(d["Brand"], json!("Gavril"));
    }

    #[test]
    fn failed_validation_leaves_original_untouched() {
        let tmp = tempdir().expect("tempdir");
        let zip_path = tmp.path().join("car.zip");
        write_zip(&zip_path, &[("vehicles/car/info.json", br#"{"Name": "Car"}"#)]);
        let original = fs::read(&zip_path).expect("read");

        let p = plan(&["Brand=Gavril"], &[], &[]);
        let editor = Editor {
            plan: &p,
            scope: EditScope::parse("all").expect("scope"),
            prefer_primary: false,
            include_mod_info: false,
            apply: true,
            in_place: true,
            validator: &RejectAll,
        };
        let record = editor.edit_archive(&zip_path);
        assert_eq!(record.status, EditStatus::Error);
        assert!(record.reason.contains("rejected"));
        assert_eq!(fs::read(&zip_path).expect("read"), original);
        assert!(!backup_path(&zip_path).exists());
        assert!(!tmp.path().join("car.edited.zip").exists());
        let leftovers: Vec<_> = fs::read_dir(tmp.path()).expect("ls").collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn dry_run_reports_targets_without_writing() {
        let tmp = tempdir().expect("tempdir");
        let zip_path = tmp.path().join("m.zip");
        write_zip(&zip_path, &[("mod_info/X/info.json", b"{}"), ("art/a.png", b"")]);
        let p = plan(&["a=1"], &[], &[]);
        let validator = ZipValidator::default();
        let editor = Editor {
            plan: &p,
            scope: EditScope::parse("vehicles,mod_info").expect("scope"),
            prefer_primary: false,
            include_mod_info: false,
            apply: false,
            in_place: false,
            validator: &validator,
        };
        let record = editor.edit_archive(&zip_path);
        assert_eq!(record.status, EditStatus::DryRun);
        assert_eq!(record.targets, vec!["mod_info/X/info.json"]);
        assert_eq!(fs::read_dir(tmp.path()).expect("ls").count(), 1);
    }
}
