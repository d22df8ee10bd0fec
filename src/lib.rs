//! poster-catalog: a local catalog of "work" records (title, year, optional
//! episode/character/identity/timestamp labels, and an ordered list of
//! inline photos) backed by SQLite.
//!
//! The library is the data pipeline: format detection and parsing for
//! CSV/XLSX/JSON/zip sources, header-alias normalization, validation,
//! batched sequential commit, and export with optional per-photo
//! recompression and archive packaging. UI concerns live in callers, which
//! reach the pipeline only through [`catalog::WorkStore`], the import
//! session, and the export surface.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod export;
pub mod import;

pub use catalog::{
    iso_now, CatalogStore, ExportEnvelope, ExportOptions, WorkDraft, WorkRecord, WorkStore,
};
pub use error::{CodecError, ExportError, ImportError, StoreError};
pub use export::{export_snapshot, ExportFormat, ExportOutput, ENVELOPE_VERSION};
pub use import::{
    commit_import, detect_and_parse, CommitReport, FileFormat, ImportSession, ImportStage,
    ParseOutcome, PREVIEW_LIMIT,
};
