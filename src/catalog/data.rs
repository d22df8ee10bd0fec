/// Shared data structures for the catalog
///
/// These structs represent the data model that flows between the store,
/// the import/export coordinators, and callers. Field names serialize as
/// camelCase so new envelopes stay compatible with previously exported data.
use serde::{Deserialize, Serialize};

/// A single catalogued work with its ordered photo list.
///
/// `photos` holds inline `data:` URLs; index 0 is the cover thumbnail and
/// the order is meaningful end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRecord {
    /// Unique store-assigned id, immutable once assigned
    pub id: i64,
    /// Display title, always non-empty for stored records
    pub title: String,
    /// Release year
    pub year: i64,
    /// Episode number within the work, if any
    #[serde(default)]
    pub episode: Option<i64>,
    /// Character name, if any
    #[serde(default)]
    pub character: Option<String>,
    /// Character identity/role label, if any
    #[serde(default)]
    pub identity: Option<String>,
    /// Free-form timestamp label, e.g. "00:15:30"
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Ordered inline photos (data URLs)
    #[serde(default)]
    pub photos: Vec<String>,
    /// RFC 3339 creation time, set once and preserved across edits
    pub created_at: String,
}

/// A work without an id: either a validated import candidate or a fresh
/// record about to be added through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDraft {
    pub title: String,
    pub year: i64,
    #[serde(default)]
    pub episode: Option<i64>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    /// Preserved from re-imported data when present; the commit path fills
    /// it with the current time when absent.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WorkRecord {
    /// Turn a stored record back into a draft, dropping the id.
    ///
    /// Used when re-importing exported data: ids are never trusted from
    /// the source, the store always assigns fresh ones.
    pub fn into_draft(self) -> WorkDraft {
        WorkDraft {
            title: self.title,
            year: self.year,
            episode: self.episode,
            character: self.character,
            identity: self.identity,
            timestamp: self.timestamp,
            photos: self.photos,
            created_at: Some(self.created_at),
        }
    }
}

/// Caller-tunable knobs for export-time photo recompression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Recompress every photo during export
    pub compress_images: bool,
    /// Photos wider than this are scaled down, aspect preserved
    pub max_width: u32,
    /// JPEG quality in (0, 1]
    pub quality: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            compress_images: false,
            max_width: 1920,
            quality: 0.7,
        }
    }
}

/// The versioned wrapper written by export and accepted back by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    /// Envelope format version
    pub version: String,
    /// RFC 3339 time the export was taken
    pub export_date: String,
    /// Always equals `works.len()`
    pub total_works: usize,
    /// The options the export ran with
    pub options: ExportOptions,
    /// Snapshot of every work in the catalog
    pub works: Vec<WorkRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_camel_case() {
        let record = WorkRecord {
            id: 3,
            title: "示例电视剧".to_string(),
            year: 2024,
            episode: Some(1),
            character: Some("张三".to_string()),
            identity: Some("主角".to_string()),
            timestamp: Some("00:15:30".to_string()),
            photos: vec!["data:image/png;base64,AAAA".to_string()],
            created_at: "2024-01-02T03:04:05.000Z".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["createdAt"], "2024-01-02T03:04:05.000Z");
        assert_eq!(json["photos"][0], "data:image/png;base64,AAAA");

        let restored: WorkRecord = serde_json::from_value(json).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn draft_tolerates_missing_optionals() {
        let draft: WorkDraft =
            serde_json::from_str(r#"{"title": "A Drama", "year": 2023}"#).unwrap();
        assert_eq!(draft.title, "A Drama");
        assert_eq!(draft.year, 2023);
        assert!(draft.episode.is_none());
        assert!(draft.photos.is_empty());
        assert!(draft.created_at.is_none());
    }

    #[test]
    fn export_options_defaults() {
        let options = ExportOptions::default();
        assert!(!options.compress_images);
        assert_eq!(options.max_width, 1920);
        assert!((options.quality - 0.7).abs() < f32::EPSILON);
    }
}
