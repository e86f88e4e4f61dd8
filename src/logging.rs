use std::env;
use tracing::Level;

fn level_from_env(raw: Option<&str>) -> Option<Level> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn resolve_level(verbose: bool, quiet: bool, from_env: Option<&str>) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    if quiet {
        return Level::WARN;
    }
    level_from_env(from_env).unwrap_or(Level::INFO)
}

/// Stderr subscriber; stdout stays reserved for the command report.
pub fn init(verbose: bool, quiet: bool) {
    let from_env = env::var("MODZIP_LOG").ok();
    let level = resolve_level(verbose, quiet, from_env.as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
