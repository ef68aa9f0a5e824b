//! Manifest loading: the JSON list of files the remote site serves.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid json at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One remote file: relative name plus the expected byte size when known.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Reads the whole manifest up front. A missing or malformed file aborts the
/// run before any network traffic.
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let raw = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_with_and_without_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.json");
        fs::write(
            &path,
            r#"[{"name":"a.pdf","size":10},{"name":"docs/b.doc"},{"name":"c.htm","size":0,"note":"extra keys ignored"}]"#,
        )
        .unwrap();

        let entries = load_manifest(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "a.pdf");
        assert_eq!(entries[0].size, Some(10));
        assert_eq!(entries[1].name, "docs/b.doc");
        assert_eq!(entries[1].size, None);
        assert_eq!(entries[2].size, Some(0));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.json");
        fs::write(&path, "[{\"name\": \"a.pdf\"").unwrap();

        let err = load_manifest(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
