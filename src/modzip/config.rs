use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::ModzipError;
use crate::modzip::normalize::MergePolicy;
use crate::modzip::notify::NotifyMode;
use crate::modzip::select::SelectionMode;
use crate::modzip::warn::{self, WarnEvent};

include!(concat!(env!("OUT_DIR"), "/modzip_env_allowlist.rs"));

pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    "art",
    "gameplay",
    "lua",
    "music",
    "resources",
    "scripts",
    "settings",
    "shaders",
];

const MAX_DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 0 disables truncation.
    pub max_cell_chars: usize,
    pub exclude_dirs: Vec<String>,
    pub selection_mode: SelectionMode,
    pub merge_policy: MergePolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_cell_chars: 1000,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            selection_mode: SelectionMode::Strict,
            merge_policy: MergePolicy::Distinct,
        }
    }
}

impl ScanConfig {
    /// Lower-cased exclusion set as the scanner expects it.
    pub fn exclude_set(&self) -> BTreeSet<String> {
        self.exclude_dirs
            .iter()
            .map(|d| d.trim().trim_matches('/').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub workers: usize,
    /// 0 disables progress lines.
    pub progress_every: usize,
    pub notify: NotifyMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers: cpus.min(MAX_DEFAULT_WORKERS),
            progress_every: 50,
            notify: NotifyMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub scan: ScanConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PartialToolConfig {
    scan: Option<ScanConfig>,
    run: Option<RunConfig>,
}

/// Command-line values; `None` keeps whatever the lower layers decided.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_cell_chars: Option<usize>,
    pub exclude_dirs: Option<Vec<String>>,
    pub workers: Option<usize>,
    pub selection_mode: Option<SelectionMode>,
    pub merge_policy: Option<MergePolicy>,
    pub notify: Option<NotifyMode>,
}

fn lookup_trimmed(lookup: &dyn Fn(&str) -> Option<String>, var: &str) -> Option<String> {
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_usize(lookup: &dyn Fn(&str) -> Option<String>, var: &str, fallback: usize) -> usize {
    lookup_trimmed(lookup, var)
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(fallback)
}

fn env_or_csv(lookup: &dyn Fn(&str) -> Option<String>, var: &str, fallback: &[String]) -> Vec<String> {
    match lookup(var) {
        Some(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        None => fallback.to_vec(),
    }
}

fn env_or_parsed<T>(
    lookup: &dyn Fn(&str) -> Option<String>,
    var: &str,
    fallback: T,
    parse: fn(&str) -> Option<T>,
) -> Result<T, ModzipError> {
    match lookup_trimmed(lookup, var) {
        Some(raw) => {
            parse(&raw).ok_or_else(|| ModzipError::InvalidConfig(format!("{var}={raw}")))
        }
        None => Ok(fallback),
    }
}

pub fn validate(cfg: &ToolConfig) -> Result<(), ModzipError> {
    if cfg.scan.max_cell_chars == 1 {
        return Err(ModzipError::InvalidConfig(
            "max_cell_chars must be 0 (unlimited) or >= 2".to_string(),
        ));
    }
    if cfg.run.workers == 0 {
        return Err(ModzipError::InvalidConfig(
            "workers must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn resolve_config_path(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(custom) = lookup_trimmed(lookup, "MODZIP_CONFIG_PATH") {
        return Some(PathBuf::from(custom));
    }
    let home = dirs::home_dir()?;
    Some(home.join(".modzip").join("config.toml"))
}

fn merge_file_config(base: &mut ToolConfig, path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let parsed: PartialToolConfig = toml::from_str(&raw).map_err(|err| {
        ModzipError::InvalidConfig(format!("failed to parse {}: {err}", path.display()))
    })?;
    if let Some(scan) = parsed.scan {
        base.scan = scan;
    }
    if let Some(run) = parsed.run {
        base.run = run;
    }
    Ok(())
}

fn merge_env(cfg: &mut ToolConfig, lookup: &dyn Fn(&str) -> Option<String>) -> Result<(), ModzipError> {
    cfg.scan.max_cell_chars = env_or_usize(lookup, "MODZIP_MAX_CELL_CHARS", cfg.scan.max_cell_chars);
    cfg.scan.exclude_dirs = env_or_csv(lookup, "MODZIP_EXCLUDE_DIRS", &cfg.scan.exclude_dirs);
    cfg.scan.selection_mode = env_or_parsed(
        lookup,
        "MODZIP_SELECTION_MODE",
        cfg.scan.selection_mode,
        SelectionMode::parse,
    )?;
    cfg.scan.merge_policy = env_or_parsed(
        lookup,
        "MODZIP_MERGE_POLICY",
        cfg.scan.merge_policy,
        MergePolicy::parse,
    )?;
    cfg.run.workers = env_or_usize(lookup, "MODZIP_WORKERS", cfg.run.workers);
    cfg.run.progress_every = env_or_usize(lookup, "MODZIP_PROGRESS_EVERY", cfg.run.progress_every);
    cfg.run.notify = env_or_parsed(lookup, "MODZIP_NOTIFY", cfg.run.notify, NotifyMode::parse)?;
    Ok(())
}

fn apply_overrides(cfg: &mut ToolConfig, overrides: &ConfigOverrides) {
    if let Some(n) = overrides.max_cell_chars {
        cfg.scan.max_cell_chars = n;
    }
    if let Some(dirs) = &overrides.exclude_dirs {
        cfg.scan.exclude_dirs = dirs.clone();
    }
    if let Some(n) = overrides.workers {
        cfg.run.workers = n;
    }
    if let Some(mode) = overrides.selection_mode {
        cfg.scan.selection_mode = mode;
    }
    if let Some(policy) = overrides.merge_policy {
        cfg.scan.merge_policy = policy;
    }
    if let Some(notify) = overrides.notify {
        cfg.run.notify = notify;
    }
}

/// Defaults, then the config file, then `MODZIP_*` variables, then flags.
pub fn load_config(overrides: &ConfigOverrides) -> Result<ToolConfig> {
    let lookup = |var: &str| env::var(var).ok();
    warn_unknown_env(env::vars_os().map(|(k, _)| k.to_string_lossy().into_owned()));
    load_config_with(&lookup, resolve_config_path(&lookup), overrides)
}

fn load_config_with(
    lookup: &dyn Fn(&str) -> Option<String>,
    file: Option<PathBuf>,
    overrides: &ConfigOverrides,
) -> Result<ToolConfig> {
    let mut cfg = ToolConfig::default();
    merge_file_config(&mut cfg, file)?;
    merge_env(&mut cfg, lookup)?;
    apply_overrides(&mut cfg, overrides);
    validate(&cfg)?;
    Ok(cfg)
}

pub fn unknown_env_keys<I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut unknown: Vec<String> = keys
        .into_iter()
        .filter(|k| k.starts_with("MODZIP_"))
        .filter(|k| !GENERATED_MODZIP_ENV_ALLOWLIST.contains(&k.as_str()))
        .collect();
    unknown.sort();
    unknown
}

fn warn_unknown_env<I>(keys: I)
where
    I: IntoIterator<Item = String>,
{
    for key in unknown_env_keys(keys) {
        warn::emit(WarnEvent {
            code: "E_CONFIG",
            stage: "config",
            action: "ignored",
            reason: "unknown_env_var",
            err: &key,
            ..WarnEvent::default()
        });
    }
}
