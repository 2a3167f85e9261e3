//! JSON rendering and persistence for summaries and check reports.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a value to a JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(Error::from)
}

/// Write a value as pretty JSON, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = to_json(value, JsonFormat::Pretty)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|e| {
        Error::Summary(format!("Failed to parse {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_to_json_pretty() {
        let mut value = BTreeMap::new();
        value.insert("full_text", "/tmp/full_text.txt");

        let json = to_json(&value, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"full_text\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let value = vec!["a", "b"];
        let json = to_json(&value, JsonFormat::Compact).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }

    #[test]
    fn test_read_json_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result: Result<Vec<String>> = read_json(&path);
        assert!(matches!(result, Err(Error::Summary(_))));
    }
}
