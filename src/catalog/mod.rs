//! Catalog state module
//!
//! This module owns the persistent side of the application:
//! - The SQLite-backed store and its storage trait (store.rs)
//! - Shared data structures for records and envelopes (data.rs)

pub mod data;
pub mod store;

pub use data::{ExportEnvelope, ExportOptions, WorkDraft, WorkRecord};
pub use store::{CatalogStore, WorkStore};

use chrono::{SecondsFormat, Utc};

/// Current time as RFC 3339 with millisecond precision and a `Z` suffix,
/// the same shape `Date.toISOString()` produced in previously exported data.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
