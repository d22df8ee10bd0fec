//! File format detection from the declared file name.

use std::path::Path;

use crate::error::ImportError;

/// Import formats, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Zip archive carrying a single `data.json` entry
    Archive,
    /// `{"works": [...]}` document or full export envelope
    Json,
    /// First sheet of an .xlsx/.xls workbook
    Spreadsheet,
    /// Comma-separated text with a header row
    Csv,
}

impl FileFormat {
    /// Detect the format from the declared name's extension.
    ///
    /// Content sniffing is deliberately not attempted; the declared type is
    /// the signal, exactly as a file picker would report it.
    pub fn detect(declared_name: &str) -> Result<Self, ImportError> {
        let extension = Path::new(declared_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());

        match extension.as_deref() {
            Some("zip") => Ok(Self::Archive),
            Some("json") => Ok(Self::Json),
            Some("xlsx") | Some("xls") => Ok(Self::Spreadsheet),
            Some("csv") => Ok(Self::Csv),
            _ => Err(ImportError::UnsupportedFormat(declared_name.to_string())),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Archive => "archive",
            Self::Json => "JSON",
            Self::Spreadsheet => "spreadsheet",
            Self::Csv => "CSV",
        };
        f.write_str(name)
    }
}
