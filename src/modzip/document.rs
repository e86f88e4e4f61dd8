//! Tolerant loading of the near-JSON `info.json` / `app.json` documents
//! shipped inside mod archives.
//!
//! Parsing never fails: every decode/repair attempt is tried in order and
//! the first one producing a JSON object wins. Anything else degrades to an
//! empty document, which callers treat the same as a missing file.

use serde_json::{Map, Value};

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Strict,
    Repaired,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub document: Document,
    /// `None` when no attempt produced an object.
    pub source: Option<(TextEncoding, ParseStage)>,
}

impl ParseOutcome {
    pub fn recovered(&self) -> bool {
        self.source.is_some()
    }
}

enum Attempt {
    Object(Document),
    NotObject,
    Invalid,
}

fn decode(raw: &[u8], encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(raw).ok().map(ToOwned::to_owned),
        // Every byte maps to the code point of the same value.
        TextEncoding::Latin1 => Some(raw.iter().map(|&b| char::from(b)).collect()),
    }
}

fn try_parse(text: &str) -> Attempt {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Attempt::Object(map),
        Ok(_) => Attempt::NotObject,
        Err(_) => Attempt::Invalid,
    }
}

/// Parse raw entry bytes into a document, reporting which attempt worked.
pub fn parse_document_detailed(raw: &[u8]) -> ParseOutcome {
    for encoding in [TextEncoding::Utf8, TextEncoding::Latin1] {
        let Some(text) = decode(raw, encoding) else {
            continue;
        };

        let stages = [
            (ParseStage::Strict, None),
            (ParseStage::Repaired, Some(repair_text(&text))),
        ];
        for (stage, repaired) in stages {
            let candidate = repaired.as_deref().unwrap_or(&text);
            match try_parse(candidate) {
                Attempt::Object(document) => {
                    return ParseOutcome {
                        document,
                        source: Some((encoding, stage)),
                    };
                }
                // Valid JSON that is not a mapping is final: another
                // encoding would decode to the same structure.
                Attempt::NotObject => return ParseOutcome::default(),
                Attempt::Invalid => {}
            }
        }
    }
    ParseOutcome::default()
}

/// Repair pass for the defects seen in the wild: leading BOM, full-line
/// `//` comments, `/* */` block comments and trailing commas.
pub fn repair_text(text: &str) -> String {
    let without_bom = text.trim_start_matches('\u{feff}');
    let without_lines = strip_line_comments(without_bom);
    let without_blocks = strip_block_comments(&without_lines);

    let mut current = without_blocks;
    loop {
        let next = collapse_trailing_commas(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        if line.trim_start().starts_with("//") {
            // Keep a CR so CRLF files keep their line structure.
            if line.ends_with('\r') {
                out.push('\r');
            }
            continue;
        }
        out.push_str(line);
    }
    out
}

fn strip_block_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("*/") else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &after_open[end + 2..];
    }
    out.push_str(rest);
    out
}

/// One pass of `,<ws>*(}|])` -> `}`/`]`.
fn collapse_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && matches!(chars[j], '}' | ']') {
                out.push(chars[j]);
                i = j + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
