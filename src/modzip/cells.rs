//! Single-line, length-capped CSV cells. Whatever a cell loses to the cap
//! is kept verbatim in a sidecar record keyed by row id.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ELLIPSIS: char = '…';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    /// Untouched input and its length in chars, present only when `text`
    /// had to be cut.
    pub truncated: Option<(String, usize)>,
}

/// CR/LF/TAB and whitespace runs become one space, ends trimmed.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `max_chars == 0` disables truncation.
pub fn sanitize_cell(raw: &str, max_chars: usize) -> Cell {
    let clean = collapse_whitespace(raw);
    if max_chars == 0 || clean.chars().count() <= max_chars {
        return Cell {
            text: clean,
            truncated: None,
        };
    }
    let mut text: String = clean.chars().take(max_chars.saturating_sub(1)).collect();
    text.push(ELLIPSIS);
    Cell {
        text,
        truncated: Some((raw.to_string(), raw.chars().count())),
    }
}

/// Sidecar line for the one-row-per-archive table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationRecord {
    pub row_id: String,
    pub file_name: String,
    pub file_path: String,
    pub truncated_fields: Vec<String>,
    pub full: BTreeMap<String, String>,
    pub lengths: BTreeMap<String, usize>,
}

impl TruncationRecord {
    pub fn is_empty(&self) -> bool {
        self.truncated_fields.is_empty()
    }
}

/// Correlation key between table and sidecar; never cut.
pub const ROW_ID_COL: &str = "row_id";

/// Sanitize every field of a row in header order. Returns the cells to
/// write and the truncation record (empty when nothing was cut).
pub fn sanitize_row(
    headers: &[String],
    fields: &BTreeMap<String, String>,
    max_chars: usize,
) -> (Vec<String>, TruncationRecord) {
    let mut record = TruncationRecord {
        row_id: fields.get(ROW_ID_COL).cloned().unwrap_or_default(),
        file_name: fields.get("file_name").cloned().unwrap_or_default(),
        file_path: fields.get("file_path").cloned().unwrap_or_default(),
        ..TruncationRecord::default()
    };

    let mut cells = Vec::with_capacity(headers.len());
    for header in headers {
        let raw = fields.get(header).map(String::as_str).unwrap_or_default();
        let budget = if header == ROW_ID_COL { 0 } else { max_chars };
        let cell = sanitize_cell(raw, budget);
        if let Some((full, len)) = cell.truncated {
            record.truncated_fields.push(header.clone());
            record.full.insert(header.clone(), full);
            record.lengths.insert(header.clone(), len);
        }
        cells.push(cell.text);
    }
    (cells, record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        assert_eq!(collapse_whitespace("  a\r\nb\t\tc  "), "a b c");
        assert_eq!(sanitize_cell("x\ny", 10).text, "x y");
    }

    #[test]
    fn long_cells_are_cut_with_ellipsis() {
        let cell = sanitize_cell("abcdefghij", 5);
        assert_eq!(cell.text, "abcd…");
        assert_eq!(cell.text.chars().count(), 5);
        assert_eq!(cell.truncated, Some(("abcdefghij".to_string(), 10)));
    }

    #[test]
    fn exact_budget_is_not_truncated() {
        assert_eq!(sanitize_cell("abcde", 5).truncated, None);
        assert_eq!(sanitize_cell(&"z".repeat(5000), 0).truncated, None);
    }

    #[test]
    fn multibyte_text_counts_chars_not_bytes() {
        let cell = sanitize_cell("ééééé", 5);
        assert!(cell.truncated.is_none());
        let cut = sanitize_cell("éééééé", 5);
        assert_eq!(cut.text, "éééé…");
    }

    #[test]
    fn sidecar_restores_every_truncated_field_exactly() {
        let mut fields = BTreeMap::new();
        let long_message = format!("line one\n{}", "m".repeat(40));
        fields.insert("row_id".to_string(), "abc123".to_string());
        fields.insert("message".to_string(), long_message.clone());
        fields.insert("Name".to_string(), "short".to_string());
        let headers = vec!["row_id".to_string(), "Name".to_string(), "message".to_string()];

        let (cells, record) = sanitize_row(&headers, &fields, 12);
        assert_eq!(cells[1], "short");
        assert!(cells[2].ends_with(ELLIPSIS));
        assert_eq!(record.row_id, "abc123");
        assert_eq!(record.truncated_fields, vec!["message"]);

        let line = serde_json::to_string(&record).expect("serialize");
        let restored: TruncationRecord = serde_json::from_str(&line).expect("parse");
        assert_eq!(restored.full["message"], long_message);
        assert_eq!(restored.lengths["message"], long_message.chars().count());
    }

    #[test]
    fn row_id_survives_tiny_budgets() {
        let fields = BTreeMap::from([
            ("row_id".to_string(), "0123456789ab".to_string()),
            ("title".to_string(), "Industrial Site".to_string()),
        ]);
        let headers = vec!["row_id".to_string(), "title".to_string()];

        let (cells, record) = sanitize_row(&headers, &fields, 8);
        assert_eq!(cells[0], "0123456789ab");
        assert_eq!(cells[0], record.row_id);
        assert_eq!(record.truncated_fields, vec!["title"]);
        assert_eq!(record.full["title"], "Industrial Site");
    }
}
