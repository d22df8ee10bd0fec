//! JSON import: a top-level object with a `works` array.
//!
//! This path trusts previously exported data, so records skip alias mapping
//! and flow straight to validation.

use serde::Deserialize;

use super::normalize::RawCandidate;
use crate::error::ImportError;

/// Accepts both a full export envelope and a bare `{"works": [...]}`
/// document; everything outside `works` is ignored.
#[derive(Debug, Deserialize)]
struct WorksDocument {
    works: Vec<RawCandidate>,
}

/// Parse JSON text into unvalidated candidates.
pub fn parse_records(text: &str) -> Result<Vec<RawCandidate>, ImportError> {
    let document: WorksDocument =
        serde_json::from_str(text).map_err(|e| ImportError::parse("JSON", e.to_string()))?;
    Ok(document.works)
}
