//! Export coordinator: snapshot, optional recompression, envelope, package.
//!
//! Compression runs as a sequential loop so only one decoded image is in
//! flight at a time; the progress callback fires after every photo.

use chrono::Utc;
use std::io::{Cursor, Write};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::catalog::{iso_now, ExportEnvelope, ExportOptions, WorkStore};
use crate::codec;
use crate::error::ExportError;
use crate::import::archive::DATA_ENTRY;

/// Envelope format version written by this crate.
pub const ENVELOPE_VERSION: &str = "1.0";

/// Output container for the export surface.
#[derive(Debug, Clone)]
pub enum ExportFormat {
    /// Raw envelope JSON text.
    Json,
    /// The envelope as a single `data.json` entry inside a zip.
    Archive,
}

/// What an export run hands back to the caller.
///
/// The date-stamped filename is a suggestion only; presentation is owned
/// by the caller.
#[derive(Debug)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub suggested_filename: String,
    pub mime_type: &'static str,
}

/// Export a read-only snapshot of the whole catalog.
///
/// Never mutates the store. With `compress_images` set, every photo of
/// every work is recompressed in order and `on_progress` receives the
/// fraction of photos processed after each one. A photo the codec cannot
/// decode is kept as-is rather than aborting the export.
pub fn export_snapshot(
    store: &dyn WorkStore,
    options: &ExportOptions,
    format: ExportFormat,
    mut on_progress: impl FnMut(f32),
) -> Result<ExportOutput, ExportError> {
    let mut works = store.get_all()?;

    if options.compress_images {
        let total: usize = works.iter().map(|work| work.photos.len()).sum();
        let mut processed = 0usize;

        for work in &mut works {
            for photo in &mut work.photos {
                match codec::recompress(photo, options.max_width, options.quality) {
                    Ok(recompressed) => *photo = recompressed,
                    Err(error) => {
                        warn!(work = work.id, %error, "photo kept uncompressed");
                    }
                }
                processed += 1;
                if total > 0 {
                    on_progress(processed as f32 / total as f32);
                }
            }
        }
    }

    let envelope = ExportEnvelope {
        version: ENVELOPE_VERSION.to_string(),
        export_date: iso_now(),
        total_works: works.len(),
        options: *options,
        works,
    };
    let text = serde_json::to_string_pretty(&envelope)?;

    info!(
        works = envelope.total_works,
        compressed = options.compress_images,
        "export envelope built"
    );

    let date = Utc::now().format("%Y-%m-%d");
    match format {
        ExportFormat::Json => Ok(ExportOutput {
            bytes: text.into_bytes(),
            suggested_filename: format!("poster-catalog-{date}.json"),
            mime_type: "application/json",
        }),
        ExportFormat::Archive => {
            let mut cursor = Cursor::new(Vec::new());
            {
                let mut writer = ZipWriter::new(&mut cursor);
                let entry_options =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                writer.start_file(DATA_ENTRY, entry_options)?;
                writer.write_all(text.as_bytes())?;
                writer.finish()?;
            }
            Ok(ExportOutput {
                bytes: cursor.into_inner(),
                suggested_filename: format!("poster-catalog-{date}.zip"),
                mime_type: "application/zip",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogStore, ExportEnvelope, WorkDraft};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn seeded_store() -> CatalogStore {
        let mut store = CatalogStore::open_in_memory().unwrap();
        store
            .add(&WorkDraft {
                title: "第一部剧".to_string(),
                year: 2024,
                episode: Some(1),
                character: Some("张三".to_string()),
                identity: Some("主角".to_string()),
                timestamp: Some("00:15:30".to_string()),
                photos: vec!["data:image/png;base64,notdecodable".to_string()],
                created_at: Some("2024-01-01T00:00:00.000Z".to_string()),
            })
            .unwrap();
        store
            .add(&WorkDraft {
                title: "Second Drama".to_string(),
                year: 2023,
                episode: None,
                character: None,
                identity: None,
                timestamp: None,
                photos: Vec::new(),
                created_at: Some("2023-06-01T00:00:00.000Z".to_string()),
            })
            .unwrap();
        store
    }

    fn parse_envelope(bytes: &[u8]) -> ExportEnvelope {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn envelope_counts_and_orders_the_snapshot() {
        let store = seeded_store();
        let output = export_snapshot(
            &store,
            &ExportOptions::default(),
            ExportFormat::Json,
            |_| {},
        )
        .unwrap();

        assert_eq!(output.mime_type, "application/json");
        assert!(output.suggested_filename.starts_with("poster-catalog-"));
        assert!(output.suggested_filename.ends_with(".json"));

        let envelope = parse_envelope(&output.bytes);
        assert_eq!(envelope.version, ENVELOPE_VERSION);
        assert_eq!(envelope.total_works, 2);
        assert_eq!(envelope.works.len(), 2);
        assert_eq!(envelope.works[0].title, "第一部剧");
        assert!(!envelope.export_date.is_empty());
    }

    #[test]
    fn export_never_mutates_the_store() {
        let store = seeded_store();
        let before = store.get_all().unwrap();
        export_snapshot(
            &store,
            &ExportOptions {
                compress_images: true,
                max_width: 10,
                quality: 0.5,
            },
            ExportFormat::Json,
            |_| {},
        )
        .unwrap();
        assert_eq!(store.get_all().unwrap(), before);
    }

    #[test]
    fn identical_exports_differ_only_in_export_date() {
        let store = seeded_store();
        let options = ExportOptions::default();
        let a = export_snapshot(&store, &options, ExportFormat::Json, |_| {}).unwrap();
        let b = export_snapshot(&store, &options, ExportFormat::Json, |_| {}).unwrap();

        let mut env_a = parse_envelope(&a.bytes);
        let mut env_b = parse_envelope(&b.bytes);
        env_a.export_date.clear();
        env_b.export_date.clear();
        assert_eq!(env_a, env_b);
    }

    #[test]
    fn archive_output_wraps_the_same_envelope() {
        let store = seeded_store();
        let output = export_snapshot(
            &store,
            &ExportOptions::default(),
            ExportFormat::Archive,
            |_| {},
        )
        .unwrap();
        assert_eq!(output.mime_type, "application/zip");
        assert!(output.suggested_filename.ends_with(".zip"));

        let text = crate::import::archive::read_data_entry(&output.bytes).unwrap();
        let envelope: ExportEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope.total_works, 2);
    }

    #[test]
    fn compression_reports_fractional_progress_and_survives_bad_photos() {
        let mut store = CatalogStore::open_in_memory().unwrap();

        let image = DynamicImage::ImageRgb8(RgbImage::new(400, 200));
        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let good = format!("data:image/png;base64,{}", BASE64.encode(&png));
        let bad = "data:image/png;base64,%%%".to_string();

        store
            .add(&WorkDraft {
                title: "Stills".to_string(),
                year: 2020,
                episode: None,
                character: None,
                identity: None,
                timestamp: None,
                photos: vec![good, bad.clone()],
                created_at: None,
            })
            .unwrap();

        let mut fractions = Vec::new();
        let output = export_snapshot(
            &store,
            &ExportOptions {
                compress_images: true,
                max_width: 100,
                quality: 0.7,
            },
            ExportFormat::Json,
            |f| fractions.push(f),
        )
        .unwrap();

        assert_eq!(fractions, vec![0.5, 1.0]);

        let envelope = parse_envelope(&output.bytes);
        let photos = &envelope.works[0].photos;
        assert!(photos[0].starts_with("data:image/jpeg;base64,"));
        // The undecodable photo passes through unmodified.
        assert_eq!(photos[1], bad);
    }
}
