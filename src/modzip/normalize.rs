//! Maps parsed documents onto the fixed output schema.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::modzip::document::Document;
use crate::modzip::schema::{APP_KEY_ALIASES, Schema};

pub type NormalizedRecord = BTreeMap<String, String>;

pub const VALUE_SEPARATOR: &str = " | ";

const MILLIS_THRESHOLD: f64 = 1e12;
/// 3000-01-01T00:00:00Z
const MAX_EPOCH_SECS: f64 = 32_503_680_000.0;
pub const HUMAN_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Distinct trimmed values joined with `" | "`, first-seen order.
    #[default]
    Distinct,
    /// The last document defining a field wins.
    LaterWins,
}

impl MergePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "distinct" => Some(Self::Distinct),
            "later-wins" | "later_wins" => Some(Self::LaterWins),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Distinct => "distinct",
            Self::LaterWins => "later-wins",
        }
    }
}

/// Scalars render as their literal text, containers as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

pub fn normalize_document(doc: &Document, schema: &Schema) -> NormalizedRecord {
    let mut out = NormalizedRecord::new();

    for key in schema.known_keys() {
        if let Some(value) = doc.get(key) {
            out.insert(key.to_string(), display_value(value));
        }
    }

    let authors = doc
        .get("authors")
        .filter(|v| !v.is_null())
        .or_else(|| doc.get("Author").filter(|v| !v.is_null()));
    if let Some(authors) = authors {
        out.insert("authors".to_string(), display_value(authors));
    }

    if let Some(value) = doc.get("last_update") {
        out.insert("last_update_human".to_string(), humanize_timestamp(value));
    }
    if let Some(value) = doc.get("resource_date") {
        out.insert("resource_date_human".to_string(), humanize_timestamp(value));
    }

    out
}

/// Copy app descriptor keys onto the names the schema knows, never
/// overwriting a key the document already has.
pub fn apply_app_aliases(app: &Document) -> Document {
    let mut out = app.clone();
    for (source, targets) in APP_KEY_ALIASES {
        let Some(value) = app.get(*source).filter(|v| !v.is_null()) else {
            continue;
        };
        for target in *targets {
            if !out.contains_key(*target) {
                out.insert((*target).to_string(), value.clone());
            }
        }
    }
    out
}

pub fn aggregate(records: &[NormalizedRecord], policy: MergePolicy) -> NormalizedRecord {
    match policy {
        MergePolicy::LaterWins => {
            let mut out = NormalizedRecord::new();
            for record in records {
                out.extend(record.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            out
        }
        MergePolicy::Distinct => {
            let mut collected: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for record in records {
                for (key, value) in record {
                    let value = value.trim();
                    if value.is_empty() {
                        continue;
                    }
                    let values = collected.entry(key.as_str()).or_default();
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
            }
            collected
                .into_iter()
                .map(|(k, vals)| (k.to_string(), vals.join(VALUE_SEPARATOR)))
                .collect()
        }
    }
}

/// Render epoch seconds/milliseconds or ISO-8601 text as
/// `YYYY-MM-DD HH:MM:SS UTC`. Unparseable input gives an empty string.
pub fn humanize_timestamp(value: &Value) -> String {
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if looks_numeric(s.trim()) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    if let Some(rendered) = numeric.and_then(epoch_to_human) {
        return rendered;
    }

    match value {
        Value::String(s) => iso_to_human(s.trim()).unwrap_or_default(),
        _ => String::new(),
    }
}

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

fn epoch_to_human(mut secs: f64) -> Option<String> {
    if secs > MILLIS_THRESHOLD {
        secs /= 1000.0;
    }
    if !(secs > 0.0 && secs < MAX_EPOCH_SECS) {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(whole, nanos).map(|dt| dt.format(HUMAN_FORMAT).to_string())
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn iso_to_human(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let text = raw.replace(['Z', 'z'], "+00:00");

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&text, fmt) {
            return Some(dt.with_timezone(&Utc).format(HUMAN_FORMAT).to_string());
        }
    }

    // Unusual offsets are dropped and the wall-clock time read as UTC.
    let naive_text = strip_trailing_offset(&text);
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive_text, fmt) {
            return Some(dt.and_utc().format(HUMAN_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(naive_text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().format(HUMAN_FORMAT).to_string())
}

/// Drops a trailing `+HH:MM` / `-HH:MM`.
fn strip_trailing_offset(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() < 6 {
        return text;
    }
    let tail = &bytes[bytes.len() - 6..];
    let is_offset = matches!(tail[0], b'+' | b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit();
    if is_offset {
        &text[..text.len() - 6]
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn seconds_and_milliseconds_render_identically() {
        let secs = humanize_timestamp(&json!(1_700_000_000));
        let millis = humanize_timestamp(&json!(1_700_000_000_000_i64));
        assert_eq!(secs, "2023-11-14 22:13:20 UTC");
        assert_eq!(secs, millis);
        assert_eq!(humanize_timestamp(&json!("1700000000")), secs);
    }

    #[test]
    fn out_of_range_and_garbage_are_empty() {
        assert_eq!(humanize_timestamp(&json!(0)), "");
        assert_eq!(humanize_timestamp(&json!(-5)), "");
        assert_eq!(humanize_timestamp(&json!("yesterday")), "");
        assert_eq!(humanize_timestamp(&json!(true)), "");
        assert_eq!(humanize_timestamp(&Value::Null), "");
    }

    #[test]
    fn iso_strings_default_to_utc_and_convert_offsets() {
        assert_eq!(
            humanize_timestamp(&json!("2021-03-04T05:06:07Z")),
            "2021-03-04 05:06:07 UTC"
        );
        assert_eq!(
            humanize_timestamp(&json!("2021-03-04T05:06:07")),
            "2021-03-04 05:06:07 UTC"
        );
        assert_eq!(
            humanize_timestamp(&json!("2021-03-04T05:06:07+02:00")),
            "2021-03-04 03:06:07 UTC"
        );
        assert_eq!(
            humanize_timestamp(&json!("2021-03-04")),
            "2021-03-04 00:00:00 UTC"
        );
    }

    #[test]
    fn known_keys_are_stringified_and_unknown_dropped() {
        let record = normalize_document(
            &doc(json!({
                "Name": "Pessima",
                "Brand": null,
                "features": ["a", "b"],
                "length": 4.5,
                "previews": {"main": "p.jpg"},
                "secret_key": "dropped",
                "via": false
            })),
            &Schema::default(),
        );
        assert_eq!(record["Name"], "Pessima");
        assert_eq!(record["Brand"], "null");
        assert_eq!(record["features"], r#"["a","b"]"#);
        assert_eq!(record["length"], "4.5");
        assert_eq!(record["previews"], r#"{"main":"p.jpg"}"#);
        assert_eq!(record["via"], "false");
        assert!(!record.contains_key("secret_key"));
    }

    #[test]
    fn authors_takes_precedence_over_author() {
        let schema = Schema::default();
        let both = normalize_document(
            &doc(json!({"authors": "Alice", "Author": "Bob"})),
            &schema,
        );
        assert_eq!(both["authors"], "Alice");
        assert_eq!(both["Author"], "Bob");

        let only_author = normalize_document(&doc(json!({"Author": "Bob"})), &schema);
        assert_eq!(only_author["authors"], "Bob");

        let null_authors =
            normalize_document(&doc(json!({"authors": null, "Author": "Carol"})), &schema);
        assert_eq!(null_authors["authors"], "Carol");
    }

    #[test]
    fn timestamp_fields_gain_human_columns() {
        let record = normalize_document(
            &doc(json!({"last_update": 1_700_000_000, "resource_date": "bogus"})),
            &Schema::default(),
        );
        assert_eq!(record["last_update"], "1700000000");
        assert_eq!(record["last_update_human"], "2023-11-14 22:13:20 UTC");
        assert_eq!(record["resource_date_human"], "");
    }

    #[test]
    fn distinct_aggregation_joins_in_first_seen_order() {
        let schema = Schema::default();
        let a = normalize_document(&doc(json!({"authors": "Alice", "title": "Utah"})), &schema);
        let b = normalize_document(&doc(json!({"authors": "Bob", "title": " Utah "})), &schema);
        let merged = aggregate(&[a.clone(), b.clone()], MergePolicy::Distinct);
        assert_eq!(merged["authors"], "Alice | Bob");
        assert_eq!(merged["title"], "Utah");

        let later = aggregate(&[a, b], MergePolicy::LaterWins);
        assert_eq!(later["authors"], "Bob");
    }

    #[test]
    fn app_aliases_fill_missing_keys_only() {
        let app = doc(json!({"name": "Speedo", "author": "Dana", "Name": "Keep"}));
        let aliased = apply_app_aliases(&app);
        assert_eq!(aliased["Name"], json!("Keep"));
        assert_eq!(aliased["title"], json!("Speedo"));
        assert_eq!(aliased["Author"], json!("Dana"));
        assert_eq!(aliased["authors"], json!("Dana"));
    }
}
