use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
///
/// Errors are automatically converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path.as_ref()).map_err(|e| Error::IoError(e))?;

    let parsed_data: T = serde_json::from_str(&data).map_err(|e| Error::DeserializationError(e))?;

    Ok(parsed_data)
}

/// Like [`parse_json_file`], but a missing file yields `Ok(None)` instead of an error.
pub fn parse_optional_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<Option<T>> {
    let path = file_path.as_ref();

    if !path.exists() {
        return Ok(None);
    }

    parse_json_file(path).map(Some)
}

/// Serializes `value` as pretty JSON and replaces `file_path` with it.
///
/// The document is first written to a sibling `*.tmp` file which is then renamed over the
/// target, so readers observe either the old or the new file, never a partial one.
pub fn write_json_file<T: Serialize>(file_path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = file_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_optional_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let parsed: Option<HashMap<String, i64>> = parse_optional_json_file(dir.path().join("missing.json")).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_write_then_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("values.json");

        let mut values = HashMap::new();
        values.insert("kn1".to_string(), 7_i64);
        write_json_file(&path, &values).unwrap();

        let parsed: HashMap<String, i64> = parse_json_file(&path).unwrap();
        assert_eq!(parsed, values);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_malformed_json_is_deserialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let parsed: Result<HashMap<String, i64>> = parse_json_file(&path);
        assert!(matches!(parsed, Err(Error::DeserializationError(_))));
    }
}
