use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::logging;
use crate::modzip::combine::{CombineOptions, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
use crate::modzip::config::ConfigOverrides;
use crate::modzip::normalize::MergePolicy;
use crate::modzip::notify::NotifyMode;
use crate::modzip::select::SelectionMode;

const EDIT_AFTER_HELP: &str = "\
Dot paths: `a.b.c` walks (and creates) the mappings `a` and `a.b`, then
acts on key `c`. If `a` or `a.b` already holds a non-mapping value (a
string, number, list...) that value is REPLACED by an empty mapping so the
path can continue. Every such overwrite is logged as W_OVERWRITE.

Per document the order is: --rename, then --set, then --remove.
--set values are parsed as JSON when they look like JSON, then leniently
(JSON5), and are otherwise kept as plain strings.

Nothing is written without --apply. With --apply a validated
`<stem>.edited.zip` is written next to each archive; --in-place then swaps
it in and keeps the original as `<name>.zip.bak`.";

#[derive(Debug, Parser)]
#[command(name = "modzip", version, about = "Inventory, rename and edit BeamNG mod archives")]
struct Cli {
    /// Debug logging.
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Warnings and errors only.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One CSV row per archive, plus a sidecar holding truncated values.
    Index(TableArgs),
    /// One CSV row per leaf key path of every info.json, plus a key summary.
    Pairs(TableArgs),
    /// Give vehicle and map archives canonical file names.
    Rename(RenameArgs),
    /// Set, remove or rename fields in the metadata documents of archives.
    #[command(after_help = EDIT_AFTER_HELP)]
    Edit(EditArgs),
    /// Merge CSV outputs into one table.
    Combine(CombineArgs),
}

#[derive(Debug, Args)]
struct TableArgs {
    /// Directory searched recursively for .zip archives.
    #[arg(long, short = 'r')]
    root: PathBuf,
    /// Output CSV; derived from the root's volume letter when omitted.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    /// Directory for the derived output name.
    #[arg(long, conflicts_with = "output")]
    out_base_dir: Option<PathBuf>,
    /// Cell length cap (0 disables truncation).
    #[arg(long)]
    max_cell_chars: Option<usize>,
    /// Comma list of top-level folders ignored inside archives.
    #[arg(long, value_delimiter = ',')]
    exclude_dirs: Option<Vec<String>>,
    #[arg(long)]
    workers: Option<usize>,
    /// strict | aggregate
    #[arg(long, value_parser = parse_selection_mode)]
    selection_mode: Option<SelectionMode>,
    /// distinct | later-wins
    #[arg(long, value_parser = parse_merge_policy)]
    merge_policy: Option<MergePolicy>,
    /// Always show the completion summary box.
    #[arg(long, conflicts_with = "no_notify")]
    notify: bool,
    /// Never show the completion summary box.
    #[arg(long)]
    no_notify: bool,
}

impl TableArgs {
    fn overrides(&self) -> ConfigOverrides {
        let notify = match (self.notify, self.no_notify) {
            (true, _) => Some(NotifyMode::Always),
            (_, true) => Some(NotifyMode::Never),
            _ => None,
        };
        ConfigOverrides {
            max_cell_chars: self.max_cell_chars,
            exclude_dirs: self.exclude_dirs.clone(),
            workers: self.workers,
            selection_mode: self.selection_mode,
            merge_policy: self.merge_policy,
            notify,
        }
    }
}

#[derive(Debug, Args)]
struct RenameArgs {
    #[arg(long, short = 'r')]
    root: PathBuf,
    /// Rename for real; the default is a dry run.
    #[arg(long)]
    apply: bool,
    /// CSV log of every decision.
    #[arg(long)]
    log: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct EditArgs {
    #[arg(long, short = 'r')]
    root: PathBuf,
    /// Comma list of vehicles, levels, mod_info, or `all`.
    #[arg(long, default_value = "all")]
    scope: String,
    /// Only edit vehicles (else levels) documents when any exist.
    #[arg(long)]
    prefer_primary: bool,
    /// With --prefer-primary, also edit mod_info documents.
    #[arg(long)]
    include_mod_info: bool,
    /// `dot.path=value`, repeatable.
    #[arg(long = "set", value_name = "PATH=VALUE")]
    sets: Vec<String>,
    /// `dot.path`, repeatable.
    #[arg(long = "remove", value_name = "PATH")]
    removes: Vec<String>,
    /// `old.path:new.path`, repeatable.
    #[arg(long = "rename", value_name = "OLD:NEW")]
    renames: Vec<String>,
    /// Write `<stem>.edited.zip`; the default is a dry run.
    #[arg(long)]
    apply: bool,
    /// With --apply, replace the original and keep `<name>.zip.bak`.
    #[arg(long, requires = "apply")]
    in_place: bool,
    /// CSV log file, or a directory to hold edit_log.csv.
    #[arg(long)]
    log: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CombineArgs {
    /// Directory searched recursively for CSV files.
    #[arg(long, short = 'i')]
    input: PathBuf,
    #[arg(long, short = 'o')]
    output: PathBuf,
    /// Case-insensitive file name globs to include (repeatable).
    #[arg(long = "include")]
    includes: Vec<String>,
    /// Case-insensitive file name globs to exclude (repeatable).
    #[arg(long = "exclude")]
    excludes: Vec<String>,
    /// Add a `source_file` column with each row's CSV file name.
    #[arg(long)]
    add_source_col: bool,
}

fn parse_selection_mode(raw: &str) -> Result<SelectionMode, String> {
    SelectionMode::parse(raw).ok_or_else(|| format!("expected strict or aggregate, got `{raw}`"))
}

fn parse_merge_policy(raw: &str) -> Result<MergePolicy, String> {
    MergePolicy::parse(raw).ok_or_else(|| format!("expected distinct or later-wins, got `{raw}`"))
}

fn or_defaults(given: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if given.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        given
    }
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let report = match cli.command {
        Command::Index(args) => commands::index::run(&commands::index::IndexOptions {
            overrides: args.overrides(),
            root: args.root,
            output: args.output,
            out_base_dir: args.out_base_dir,
        })?,
        Command::Pairs(args) => commands::pairs::run(&commands::pairs::PairsOptions {
            overrides: args.overrides(),
            root: args.root,
            output: args.output,
            out_base_dir: args.out_base_dir,
        })?,
        Command::Rename(args) => commands::rename::run(&commands::rename::RenameOptions {
            root: args.root,
            apply: args.apply,
            log: args.log,
        })?,
        Command::Edit(args) => commands::edit::run(&commands::edit::EditOptions {
            root: args.root,
            scope: args.scope,
            prefer_primary: args.prefer_primary,
            include_mod_info: args.include_mod_info,
            sets: args.sets,
            removes: args.removes,
            renames: args.renames,
            apply: args.apply,
            in_place: args.in_place,
            log: args.log,
        })?,
        Command::Combine(args) => commands::combine::run(&commands::combine::CombineCommandOptions {
            input: args.input,
            output: args.output,
            combine: CombineOptions {
                includes: or_defaults(args.includes, DEFAULT_INCLUDE),
                excludes: or_defaults(args.excludes, DEFAULT_EXCLUDE),
                add_source_col: args.add_source_col,
            },
        })?,
    };

    print_report(&report, cli.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn table_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "modzip",
            "index",
            "-r",
            "/mods",
            "--exclude-dirs",
            "art,lua",
            "--selection-mode",
            "aggregate",
            "--no-notify",
        ])
        .expect("parse");
        let Command::Index(args) = cli.command else {
            panic!("index expected");
        };
        let overrides = args.overrides();
        assert_eq!(
            overrides.exclude_dirs,
            Some(vec!["art".to_string(), "lua".to_string()])
        );
        assert_eq!(overrides.selection_mode, Some(SelectionMode::Aggregate));
        assert_eq!(overrides.notify, Some(NotifyMode::Never));
        assert_eq!(overrides.workers, None);
    }

    #[test]
    fn in_place_needs_apply() {
        let parsed = Cli::try_parse_from(["modzip", "edit", "-r", "/mods", "--in-place"]);
        assert!(parsed.is_err());
    }
}
