//! Classification of archive entries by compartment (first path segment)
//! and collection of metadata document candidates.

use std::collections::BTreeSet;

pub const INFO_FILE_NAME: &str = "info.json";
pub const APP_FILE_NAME: &str = "app.json";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Compartment {
    Levels,
    Vehicles,
    ModInfo,
    Ui,
    Other,
}

impl Compartment {
    pub fn from_segment(segment: &str) -> Self {
        match segment.to_ascii_lowercase().as_str() {
            "levels" => Self::Levels,
            "vehicles" => Self::Vehicles,
            "mod_info" => Self::ModInfo,
            "ui" => Self::Ui,
            _ => Self::Other,
        }
    }
}

/// Forward slashes only, no leading slash.
pub fn normalize_entry_path(raw: &str) -> String {
    raw.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Lower-cased first segment of an already normalized path.
pub fn top_level_segment(path: &str) -> String {
    path.split('/').next().unwrap_or_default().to_ascii_lowercase()
}

pub fn compartment_of(path: &str) -> Compartment {
    Compartment::from_segment(&top_level_segment(path))
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn is_info_document(path: &str) -> bool {
    base_name(path).eq_ignore_ascii_case(INFO_FILE_NAME)
}

/// `ui/modules/apps/<name>/.../app.json`
pub fn is_ui_app_descriptor(path: &str) -> bool {
    let parts: Vec<&str> = path.split('/').collect();
    parts.len() >= 5
        && parts[0].eq_ignore_ascii_case("ui")
        && parts[1].eq_ignore_ascii_case("modules")
        && parts[2].eq_ignore_ascii_case("apps")
        && parts[parts.len() - 1].eq_ignore_ascii_case(APP_FILE_NAME)
}

pub fn ui_name_from_app_path(path: &str) -> Option<&str> {
    if !is_ui_app_descriptor(path) {
        return None;
    }
    path.split('/').nth(3).filter(|name| !name.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryScan {
    /// Every `info.json` outside excluded compartments, archive order.
    pub info_paths: Vec<String>,
    /// Every UI app descriptor outside excluded compartments, archive order.
    pub app_paths: Vec<String>,
    pub map_name: Option<String>,
    pub vehicle_name: Option<String>,
}

impl EntryScan {
    pub fn info_in(&self, compartment: &Compartment) -> Vec<String> {
        self.info_paths
            .iter()
            .filter(|p| compartment_of(p) == *compartment)
            .cloned()
            .collect()
    }
}

/// Scan entry names in archive order. `exclude` holds lower-cased top-level
/// segment names; matching entries are skipped before anything else looks
/// at them.
pub fn scan_entries<I, S>(names: I, exclude: &BTreeSet<String>) -> EntryScan
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scan = EntryScan::default();
    for raw in names {
        let path = normalize_entry_path(raw.as_ref());
        if path.is_empty() || exclude.contains(&top_level_segment(&path)) {
            continue;
        }

        record_derived_names(&path, &mut scan);

        if is_info_document(&path) {
            scan.info_paths.push(path);
        } else if is_ui_app_descriptor(&path) {
            scan.app_paths.push(path);
        }
    }
    scan
}

fn record_derived_names(path: &str, scan: &mut EntryScan) {
    if scan.map_name.is_some() && scan.vehicle_name.is_some() {
        return;
    }
    let parts: Vec<&str> = path.split('/').collect();
    for pair in parts.windows(2) {
        let (segment, next) = (pair[0], pair[1]);
        if next.is_empty() {
            continue;
        }
        if scan.map_name.is_none() && segment.eq_ignore_ascii_case("levels") {
            scan.map_name = Some(next.to_string());
        }
        if scan.vehicle_name.is_none() && segment.eq_ignore_ascii_case("vehicles") {
            scan.vehicle_name = Some(next.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_exclusions() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn backslash_paths_are_normalized() {
        assert_eq!(
            normalize_entry_path("\\levels\\west_coast\\info.json"),
            "levels/west_coast/info.json"
        );
        assert_eq!(compartment_of("LEVELS/x/info.json"), Compartment::Levels);
        assert_eq!(compartment_of("art/x.png"), Compartment::Other);
    }

    #[test]
    fn scan_collects_info_and_app_documents_in_archive_order() {
        let names = [
            "vehicles/pessima/INFO.JSON",
            "ui/modules/apps/Speedo/app.json",
            "mod_info/ABC/info.json",
            "vehicles/pessima/info_sedan.json",
            "levels/",
        ];
        let scan = scan_entries(names, &no_exclusions());
        assert_eq!(
            scan.info_paths,
            vec!["vehicles/pessima/INFO.JSON", "mod_info/ABC/info.json"]
        );
        assert_eq!(scan.app_paths, vec!["ui/modules/apps/Speedo/app.json"]);
        assert_eq!(scan.vehicle_name.as_deref(), Some("pessima"));
        assert_eq!(scan.map_name, None);
    }

    #[test]
    fn excluded_compartments_are_invisible() {
        let names = ["scripts/x/info.json", "levels/utah/info.json"];
        let exclude: BTreeSet<String> = ["scripts".to_string()].into_iter().collect();
        let scan = scan_entries(names, &exclude);
        assert_eq!(scan.info_paths, vec!["levels/utah/info.json"]);
    }

    #[test]
    fn derived_names_come_from_first_entry_in_archive_order() {
        let names = [
            "levels/zeta/main.level.json",
            "levels/alpha/info.json",
            "art/vehicles/covet/skin.dds",
        ];
        let scan = scan_entries(names, &no_exclusions());
        assert_eq!(scan.map_name.as_deref(), Some("zeta"));
        assert_eq!(scan.vehicle_name.as_deref(), Some("covet"));
    }

    #[test]
    fn ui_descriptor_needs_app_directory() {
        assert!(is_ui_app_descriptor("ui/modules/apps/Speedo/app.json"));
        assert!(!is_ui_app_descriptor("ui/modules/apps/app.json"));
        assert_eq!(
            ui_name_from_app_path("ui/modules/apps/Speedo/app.json"),
            Some("Speedo")
        );
    }
}
