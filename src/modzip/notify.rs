use serde::{Deserialize, Serialize};
use std::env;
use std::io::{IsTerminal, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// Only for interactive sessions.
    #[default]
    Auto,
    Always,
    Never,
}

impl NotifyMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "always" | "on" | "true" | "1" => Some(Self::Always),
            "never" | "off" | "false" | "0" => Some(Self::Never),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Always => "always",
            Self::Never => "never",
        }
    }
}

/// Scheduled runs (no terminal, or a Windows service session) never get
/// the summary box in `auto` mode.
pub fn should_notify(mode: NotifyMode, interactive: bool, session_name: Option<&str>) -> bool {
    match mode {
        NotifyMode::Always => true,
        NotifyMode::Never => false,
        NotifyMode::Auto => {
            interactive && !session_name.is_some_and(|s| s.trim().eq_ignore_ascii_case("services"))
        }
    }
}

pub fn render_box(title: &str, lines: &[String]) -> String {
    let width = std::iter::once(title)
        .chain(lines.iter().map(String::as_str))
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    let rule = "-".repeat(width + 2);
    let mut out = format!("+{rule}+\n| {title:<width$} |\n+{rule}+\n");
    for line in lines {
        out.push_str(&format!("| {line:<width$} |\n"));
    }
    out.push_str(&format!("+{rule}+\n"));
    out
}

pub fn completion_notice(mode: NotifyMode, title: &str, lines: &[String]) {
    let session = env::var("SESSIONNAME").ok();
    if !should_notify(mode, std::io::stdout().is_terminal(), session.as_deref()) {
        return;
    }
    let mut stderr = std::io::stderr().lock();
    let _ = stderr.write_all(render_box(title, lines).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_mode_follows_session() {
        assert!(should_notify(NotifyMode::Auto, true, None));
        assert!(should_notify(NotifyMode::Auto, true, Some("Console")));
        assert!(!should_notify(NotifyMode::Auto, true, Some("Services")));
        assert!(!should_notify(NotifyMode::Auto, false, None));
        assert!(should_notify(NotifyMode::Always, false, Some("services")));
        assert!(!should_notify(NotifyMode::Never, true, None));
    }

    #[test]
    fn box_is_padded_to_widest_line() {
        let rendered = render_box("done", &["Total: 3".to_string()]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "+----------+");
        assert_eq!(lines[1], "| done     |");
        assert_eq!(lines[3], "| Total: 3 |");
        assert!(lines.iter().all(|l| l.chars().count() == 12));
    }
}
