//! Regex-driven page rewriting.
//!
//! Submodules:
//! - `local_links` — point legacy-host document links at the local mirror
//! - `retarget`    — move remaining legacy links onto the new domain
//! - `audit`       — compare page references against the manifest
//!
//! The pages are treated as text; substitution works on the raw markup.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

pub mod audit;
pub mod local_links;
pub mod retarget;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },
}

/// Replaces `path` with `content` via a temp file in the same directory, so
/// a crash mid-write can never leave a half-rewritten page behind.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), RewriteError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_at = |source: io::Error| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_at)?;
    tmp.write_all(content.as_bytes()).map_err(io_at)?;
    tmp.flush().map_err(io_at)?;
    tmp.persist(path).map_err(|err| io_at(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn write_atomic_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.htm");
        fs::write(&page, "old").unwrap();

        write_atomic(&page, "new content").unwrap();

        assert_eq!(fs::read_to_string(&page).unwrap(), "new content");
        // no temp droppings left behind
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("index.htm")]);
    }

    #[test]
    fn write_atomic_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("fresh.htm");

        write_atomic(&page, "hello").unwrap();

        assert_eq!(fs::read_to_string(&page).unwrap(), "hello");
    }
}
