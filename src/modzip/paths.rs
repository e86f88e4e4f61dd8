use std::path::{Path, PathBuf};

pub const SIDECAR_EXTENSION: &str = "details.jsonl";

/// Single-letter tag for the storage volume holding `path`.
pub fn volume_letter(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    volume_letter_from_str(&absolute.to_string_lossy())
}

fn volume_letter_from_str(abspath: &str) -> String {
    if abspath.starts_with("\\\\") || abspath.starts_with("//") {
        return "UNC".to_string();
    }

    let mut chars = abspath.chars();
    if let (Some(first), Some(':')) = (chars.next(), chars.next()) {
        return if first.is_ascii_alphabetic() {
            first.to_ascii_uppercase().to_string()
        } else {
            "X".to_string()
        };
    }

    let normalized = abspath.replace('\\', "/");
    let parts: Vec<&str> = normalized.split('/').collect();
    if parts.len() > 2 && parts[1] == "mnt" {
        let mut letter = parts[2].chars();
        if let (Some(c), None) = (letter.next(), letter.next()) {
            if c.is_ascii_alphabetic() {
                return c.to_ascii_uppercase().to_string();
            }
        }
    }
    "X".to_string()
}

/// `explicit`, else `<base or cwd>/<prefix>_on_<L>.csv`.
pub fn output_path(
    root: &Path,
    explicit: Option<&Path>,
    out_base_dir: Option<&Path>,
    prefix: &str,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let base = out_base_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(format!("{prefix}_on_{}.csv", volume_letter(root)))
}

pub fn sidecar_path(output: &Path) -> PathBuf {
    output.with_extension(SIDECAR_EXTENSION)
}

/// Summary file for the long-form table. Derived names follow the
/// `<kind>_on_<L>` pattern; an explicit output gets `<stem>.keys_summary.csv`.
pub fn key_summary_path(root: &Path, output: &Path, explicit: bool) -> PathBuf {
    if explicit {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "allpairs".to_string());
        return output.with_file_name(format!("{stem}.keys_summary.csv"));
    }
    output.with_file_name(format!("keys_summary_on_{}.csv", volume_letter(root)))
}
