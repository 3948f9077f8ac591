//! Whole-document JSON persistence.
//!
//! Documents are written to a sibling temp file and renamed over the target,
//! so a crash mid-write leaves either the old or the new document.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::error::{ConfigError, StoreError};

/// Serialize `value` and atomically replace the file at `path`.
pub async fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<(), StoreError> {
    let bytes = if pretty {
        to_pretty_json(value)?
    } else {
        serde_json::to_vec(value)?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| io_error(parent, source))?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|source| io_error(&tmp, source))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| io_error(path, source))
}

/// Read and decode a JSON document. `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::IoError {
                path: path.display().to_string(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::DocumentError {
            path: path.display().to_string(),
            source,
        })
}

/// Read a JSON document that must exist.
pub fn read_required_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    read_json(path)?.ok_or_else(|| ConfigError::IoError {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
    })
}

// 4-space indentation, matching hand-edited config documents.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_write_then_read_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        let mut doc = BTreeMap::new();
        doc.insert("set_1".to_string(), vec![1, 2]);
        write_json(&path, &doc, false).await.unwrap();

        let back: BTreeMap<String, Vec<i32>> = read_required_json(&path).unwrap();
        assert_eq!(back, doc);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_pretty_output_uses_four_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let mut doc = BTreeMap::new();
        doc.insert("test", vec![7]);
        write_json(&path, &doc, true).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"test\": [\n        7\n    ]"));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result: Option<Vec<i32>> = read_json(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
        assert!(read_required_json::<Vec<i32>>(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_corrupt_file_is_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = read_json::<Vec<i32>>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::DocumentError { .. }));
    }
}
