//! Output column groups. One immutable [`Schema`] value is built per run and
//! handed to the normalizer and the header logic.

use std::collections::BTreeSet;

pub const FILE_INFO_COLS: &[&str] = &[
    "row_id",
    "directory",
    "file_name",
    "file_path",
    "file_size_bytes",
    "date_created",
    "date_modified",
];

pub const DERIVED_COLS: &[&str] = &[
    "top_level_dir",
    "map_name",
    "vehicle_name",
    "ui_name",
    "info_json_count",
    "info_json_paths",
    "app_json_count",
    "app_json_paths",
    "json_rule_used",
    "json_selected_count",
    "json_selected_paths",
];

pub const NORMALIZED_COLS: &[&str] = &["authors", "last_update_human", "resource_date_human"];

pub const VEHICLE_KEYS: &[&str] = &[
    "Author",
    "Body Style",
    "Brand",
    "Country",
    "Derby Class",
    "Description",
    "Name",
    "Region",
    "Type",
];

pub const MAP_KEYS: &[&str] = &[
    "features",
    "suitablefor",
    "authors",
    "roads",
    "title",
    "description",
    "country",
    "biome",
    "size",
    "localUnits",
    "previews",
    "length",
];

pub const OTHER_KEYS: &[&str] = &[
    "version_string",
    "last_update",
    "resource_date",
    "tag_line",
    "filename",
    "user_id",
    "username",
    "tagid",
    "message",
    "category_title",
    "prefix_title",
    "via",
];

/// App descriptors use their own spelling for a few fields.
pub const APP_KEY_ALIASES: &[(&str, &[&str])] = &[
    ("name", &["Name", "title"]),
    ("author", &["Author", "authors"]),
    ("authors", &["authors", "Author"]),
    ("description", &["Description", "description"]),
    ("brand", &["Brand"]),
    ("type", &["Type"]),
];

pub const ERROR_COL: &str = "zip_error";

#[derive(Debug, Clone)]
pub struct Schema {
    pub file_info: Vec<&'static str>,
    pub derived: Vec<&'static str>,
    pub normalized: Vec<&'static str>,
    pub vehicle_keys: Vec<&'static str>,
    pub map_keys: Vec<&'static str>,
    pub other_keys: Vec<&'static str>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            file_info: FILE_INFO_COLS.to_vec(),
            derived: DERIVED_COLS.to_vec(),
            normalized: NORMALIZED_COLS.to_vec(),
            vehicle_keys: VEHICLE_KEYS.to_vec(),
            map_keys: MAP_KEYS.to_vec(),
            other_keys: OTHER_KEYS.to_vec(),
        }
    }
}

impl Schema {
    /// Document keys copied through by the normalizer.
    pub fn known_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.vehicle_keys
            .iter()
            .chain(self.map_keys.iter())
            .chain(self.other_keys.iter())
            .copied()
    }

    /// Preferred column order, each name once.
    pub fn preferred_order(&self) -> Vec<&'static str> {
        let mut seen = BTreeSet::new();
        self.file_info
            .iter()
            .chain(self.derived.iter())
            .chain(self.normalized.iter())
            .chain(self.vehicle_keys.iter())
            .chain(self.map_keys.iter())
            .chain(self.other_keys.iter())
            .copied()
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Known columns first in preferred order, then extras sorted.
    pub fn determine_headers<'a, I>(&self, present: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let present: BTreeSet<&str> = present.into_iter().map(String::as_str).collect();
        let mut headers: Vec<String> = self
            .preferred_order()
            .into_iter()
            .filter(|name| present.contains(name))
            .map(ToOwned::to_owned)
            .collect();
        let extras: Vec<String> = present
            .iter()
            .filter(|name| !headers.iter().any(|h| h == *name))
            .map(|name| (*name).to_owned())
            .collect();
        headers.extend(extras);
        headers
    }
}
