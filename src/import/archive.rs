//! Archive import: a zip with a single mandatory `data.json` entry.

use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ImportError;

/// The one entry an import/export archive carries.
pub const DATA_ENTRY: &str = "data.json";

/// Unpack the archive and return the text of its `data.json` entry.
///
/// All photo bytes live inline inside that JSON, so no other entry is ever
/// read or expected.
pub fn read_data_entry(bytes: &[u8]) -> Result<String, ImportError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ImportError::parse("archive", e.to_string()))?;

    let mut entry = archive.by_name(DATA_ENTRY).map_err(|e| match e {
        ZipError::FileNotFound => {
            ImportError::parse("archive", format!("archive is missing its {DATA_ENTRY} entry"))
        }
        other => ImportError::parse("archive", other.to_string()),
    })?;

    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| ImportError::parse("archive", e.to_string()))?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut cursor);
            let options = SimpleFileOptions::default();
            for (name, body) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn reads_the_data_entry() {
        let bytes = archive_with(&[("data.json", r#"{"works": []}"#)]);
        assert_eq!(read_data_entry(&bytes).unwrap(), r#"{"works": []}"#);
    }

    #[test]
    fn missing_data_entry_is_a_parse_error() {
        let bytes = archive_with(&[("other.json", "{}")]);
        let err = read_data_entry(&bytes).unwrap_err();
        assert!(err.to_string().contains("data.json"));
    }

    #[test]
    fn non_zip_bytes_are_a_parse_error() {
        assert!(read_data_entry(b"definitely not a zip").is_err());
    }
}
