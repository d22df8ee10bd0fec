//! Error families for the catalog pipeline.
//!
//! Each stage owns its own error enum so callers can tell a fatal parse
//! failure apart from a per-record commit failure or a recoverable codec
//! failure.

use thiserror::Error;

/// Errors from the persistent store.
///
/// Every store operation runs in its own transaction scope, so one of these
/// only ever describes a single failed call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite database rejected the operation.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An update was attempted for an id that is not in the store.
    /// `update` never implicitly creates records.
    #[error("no work with id {0} in the catalog")]
    NotFound(i64),

    /// The stored photo list could not be encoded or decoded as JSON.
    #[error("invalid photo payload: {0}")]
    PhotoPayload(#[from] serde_json::Error),
}

/// Fatal errors raised before an import preview can be shown.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The declared file name carries no recognized extension.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The file matched a known format but its contents are malformed,
    /// or a required archive entry is missing.
    #[error("failed to parse {format} data: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

impl ImportError {
    /// Shorthand for a parse failure in the given format.
    pub fn parse(format: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }
}

/// Errors from recompressing a single inline photo.
///
/// The export coordinator recovers from these by passing the original
/// photo through unmodified.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The base64 payload of a data URL could not be decoded.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not a decodable image, or re-encoding failed.
    #[error("image codec failure: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors that abort an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Taking the snapshot from the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The envelope could not be serialized to JSON.
    #[error("failed to serialize export envelope: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing the zip package failed.
    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An I/O failure while streaming into the archive.
    #[error("archive I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
