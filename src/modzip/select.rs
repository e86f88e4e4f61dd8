//! Decides which metadata documents of an archive are authoritative.
//!
//! Compartments are mutually exclusive intents: a map archive never has its
//! metadata diluted by unrelated vehicle documents. `mod_info` documents
//! are always additive context.

use serde::{Deserialize, Serialize};

use crate::modzip::scan::{Compartment, EntryScan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// levels > vehicles > ui > mod_info > nothing.
    #[default]
    Strict,
    /// levels > vehicles > every document found.
    Aggregate,
}

impl SelectionMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "aggregate" | "aggregate-all" => Some(Self::Aggregate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Aggregate => "aggregate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTag {
    Levels,
    Vehicles,
    Ui,
    ModInfo,
    AggregateAll,
    NoMetadata,
}

impl RuleTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Levels => "levels",
            Self::Vehicles => "vehicles",
            Self::Ui => "ui",
            Self::ModInfo => "mod_info",
            Self::AggregateAll => "aggregate-all",
            Self::NoMetadata => "no-metadata",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub rule: RuleTag,
    pub info_paths: Vec<String>,
    pub app_paths: Vec<String>,
}

impl Selection {
    fn new(rule: RuleTag, info_paths: Vec<String>, app_paths: Vec<String>) -> Self {
        debug_assert!(
            rule == RuleTag::NoMetadata || !(info_paths.is_empty() && app_paths.is_empty()),
            "selection may only be empty for no-metadata"
        );
        Self {
            rule,
            info_paths,
            app_paths,
        }
    }

    pub fn len(&self) -> usize {
        self.info_paths.len() + self.app_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Selected paths in parse order: info documents, then app descriptors.
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.info_paths.iter().chain(self.app_paths.iter())
    }
}

pub fn select(scan: &EntryScan, mode: SelectionMode) -> Selection {
    let levels = scan.info_in(&Compartment::Levels);
    let vehicles = scan.info_in(&Compartment::Vehicles);
    let mod_info = scan.info_in(&Compartment::ModInfo);

    if !levels.is_empty() {
        return Selection::new(RuleTag::Levels, concat(levels, mod_info), Vec::new());
    }
    if !vehicles.is_empty() {
        return Selection::new(RuleTag::Vehicles, concat(vehicles, mod_info), Vec::new());
    }

    match mode {
        SelectionMode::Strict => {
            if !scan.app_paths.is_empty() {
                return Selection::new(RuleTag::Ui, mod_info, scan.app_paths.clone());
            }
            if !mod_info.is_empty() {
                return Selection::new(RuleTag::ModInfo, mod_info, Vec::new());
            }
        }
        SelectionMode::Aggregate => {
            if !scan.info_paths.is_empty() || !scan.app_paths.is_empty() {
                return Selection::new(
                    RuleTag::AggregateAll,
                    scan.info_paths.clone(),
                    scan.app_paths.clone(),
                );
            }
        }
    }

    Selection::new(RuleTag::NoMetadata, Vec::new(), Vec::new())
}

fn concat(mut head: Vec<String>, tail: Vec<String>) -> Vec<String> {
    head.extend(tail);
    head
}
