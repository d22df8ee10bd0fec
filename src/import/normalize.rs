//! Row normalizer: maps arbitrary parsed rows onto canonical record fields.
//!
//! Source files label their columns inconsistently (Chinese headers from the
//! shipped template, English headers from hand-made sheets), so every
//! canonical field owns an ordered alias list and resolution takes the first
//! alias present in the row.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::catalog::WorkDraft;

/// A parsed but unmapped row: source column label -> cell text.
pub type RawRow = HashMap<String, String>;

/// Canonical record fields a source column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Year,
    Episode,
    Character,
    Identity,
    Timestamp,
}

/// Recognized source header labels per canonical field, probed in order.
const ALIASES: &[(Field, &[&str])] = &[
    (Field::Title, &["剧名", "title", "Title"]),
    (Field::Year, &["年份", "year", "Year"]),
    (Field::Episode, &["集数", "episode", "Episode"]),
    (Field::Character, &["人物", "character", "Character"]),
    (Field::Identity, &["身份", "identity", "Identity"]),
    (Field::Timestamp, &["时间戳", "timestamp", "Timestamp"]),
];

fn aliases_for(field: Field) -> &'static [&'static str] {
    ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

/// Resolve one canonical field from a raw row.
///
/// Takes the first alias present in the row, even when its value is empty;
/// emptiness is a validation concern, not a resolution one. Unresolved
/// labels in the row are simply ignored.
pub fn resolve<'a>(row: &'a RawRow, field: Field) -> Option<&'a str> {
    aliases_for(field)
        .iter()
        .find_map(|alias| row.get(*alias))
        .map(|value| value.trim())
}

/// Lenient integer parse in the spirit of `parseInt`: optional sign plus
/// leading ASCII digits, anything after is ignored. `"2024年"` is 2024.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// A parsed-but-unvalidated record.
///
/// Produced by the normalizer for CSV/spreadsheet rows and deserialized
/// directly from JSON/archive sources. Unknown source fields, including a
/// stale `id` from previously exported data, are dropped here; the store
/// always assigns fresh ids.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub episode: Option<i64>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl RawCandidate {
    /// Validate into a committable draft.
    ///
    /// A candidate is importable only with a non-empty title and an integer
    /// year; everything else stays optional. Returns `None` for rows that
    /// fail; the caller counts them, nothing is reported per row.
    pub fn into_draft(self) -> Option<WorkDraft> {
        if self.title.trim().is_empty() {
            return None;
        }
        let year = self.year?;
        Some(WorkDraft {
            title: self.title,
            year,
            episode: self.episode,
            character: non_empty(self.character),
            identity: non_empty(self.identity),
            timestamp: non_empty(self.timestamp),
            photos: self.photos,
            created_at: non_empty(self.created_at),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts integers, floats, numeric strings (with trailing junk), or null.
/// Anything unparsable becomes an absent value, never an error.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => {
            n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))
        }
        serde_json::Value::String(s) => parse_leading_int(&s),
        _ => None,
    })
}

/// Map one raw row to a candidate, `photos` initialized empty.
///
/// Tabular sources never carry inline images; only JSON/archive-sourced
/// records may arrive with photos already attached.
pub fn normalize_row(row: &RawRow) -> RawCandidate {
    RawCandidate {
        title: resolve(row, Field::Title).unwrap_or("").to_string(),
        year: resolve(row, Field::Year).and_then(parse_leading_int),
        episode: resolve(row, Field::Episode).and_then(parse_leading_int),
        character: resolve(row, Field::Character).map(str::to_string),
        identity: resolve(row, Field::Identity).map(str::to_string),
        timestamp: resolve(row, Field::Timestamp).map(str::to_string),
        photos: Vec::new(),
        created_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bilingual_aliases_are_equivalent() {
        let chinese = row(&[("剧名", "某剧"), ("年份", "2024")]);
        let english = row(&[("Title", "某剧"), ("Year", "2024")]);

        let a = normalize_row(&chinese).into_draft().unwrap();
        let b = normalize_row(&english).into_draft().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn aliases_probe_in_declared_order() {
        // Both the Chinese and English labels are present; the Chinese one
        // is declared first and must win.
        let both = row(&[("剧名", "中文名"), ("Title", "English Name"), ("年份", "2020")]);
        let draft = normalize_row(&both).into_draft().unwrap();
        assert_eq!(draft.title, "中文名");
    }

    #[test]
    fn year_parse_failure_is_absence_not_error() {
        let bad = row(&[("Title", "A Drama"), ("Year", "unknown")]);
        let candidate = normalize_row(&bad);
        assert!(candidate.year.is_none());
        assert!(candidate.into_draft().is_none());
    }

    #[test]
    fn leading_int_parse_is_lenient() {
        assert_eq!(parse_leading_int("2024"), Some(2024));
        assert_eq!(parse_leading_int(" 2024 "), Some(2024));
        assert_eq!(parse_leading_int("2024年"), Some(2024));
        assert_eq!(parse_leading_int("-5x"), Some(-5));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn unresolved_labels_are_ignored() {
        let extra = row(&[("Title", "A Drama"), ("Year", "2021"), ("Rating", "9.1")]);
        let draft = normalize_row(&extra).into_draft().unwrap();
        assert_eq!(draft.title, "A Drama");
        assert_eq!(draft.year, 2021);
    }

    #[test]
    fn normalized_rows_have_no_photos() {
        let r = row(&[("Title", "A Drama"), ("Year", "2021")]);
        assert!(normalize_row(&r).photos.is_empty());
    }

    #[test]
    fn json_candidate_ignores_stale_id_and_keeps_created_at() {
        let candidate: RawCandidate = serde_json::from_str(
            r#"{"id": 99, "title": "Exported", "year": 2022, "createdAt": "2022-03-04T05:06:07.000Z"}"#,
        )
        .unwrap();
        let draft = candidate.into_draft().unwrap();
        assert_eq!(draft.created_at.as_deref(), Some("2022-03-04T05:06:07.000Z"));
    }

    #[test]
    fn json_year_accepts_numbers_and_numeric_strings() {
        let from_number: RawCandidate =
            serde_json::from_str(r#"{"title": "N", "year": 2024}"#).unwrap();
        let from_float: RawCandidate =
            serde_json::from_str(r#"{"title": "F", "year": 2024.0}"#).unwrap();
        let from_string: RawCandidate =
            serde_json::from_str(r#"{"title": "S", "year": "2024"}"#).unwrap();
        let from_null: RawCandidate =
            serde_json::from_str(r#"{"title": "X", "year": null}"#).unwrap();

        assert_eq!(from_number.year, Some(2024));
        assert_eq!(from_float.year, Some(2024));
        assert_eq!(from_string.year, Some(2024));
        assert_eq!(from_null.year, None);
    }
}
