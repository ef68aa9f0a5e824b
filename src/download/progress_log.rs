//! Durable record of completed downloads, one name per line.
//!
//! The log is append-only; completed names are never rewritten or compacted.
//! An append is synced to disk before the download counts as recorded, so a
//! crash right after a finished transfer can lose at most the log line, never
//! corrupt it — the next run re-verifies that file by size instead.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct ProgressLog {
    seen: HashSet<String>,
    writer: File,
    path: PathBuf,
}

impl ProgressLog {
    /// Opens the log, loading every recorded name. A missing file means
    /// nothing has been downloaded yet.
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut seen = HashSet::new();
        match fs::read_to_string(path) {
            Ok(text) => {
                for line in text.lines() {
                    let name = line.trim();
                    if !name.is_empty() {
                        seen.insert(name.to_string());
                    }
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }

        let writer = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            seen,
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `name` and syncs it down before returning. Recording a name
    /// twice is a no-op.
    pub fn record(&mut self, name: &str) -> io::Result<()> {
        if !self.seen.insert(name.to_string()) {
            return Ok(());
        }
        // one write call per line so a crash cannot interleave partial lines
        let mut line = String::with_capacity(name.len() + 1);
        line.push_str(name);
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.sync_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_log_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ProgressLog::open(&dir.path().join("progress.txt")).unwrap();
        assert!(log.is_empty());
        assert!(!log.contains("a.pdf"));
    }

    #[test]
    fn record_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.txt");

        let mut log = ProgressLog::open(&path).unwrap();
        log.record("a.pdf").unwrap();
        log.record("docs/b.doc").unwrap();
        drop(log);

        let log = ProgressLog::open(&path).unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.contains("a.pdf"));
        assert!(log.contains("docs/b.doc"));
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.txt");
        fs::write(&path, "a.pdf\n\n  b.pdf  \n   \n").unwrap();

        let log = ProgressLog::open(&path).unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.contains("a.pdf"));
        assert!(log.contains("b.pdf"));
    }

    #[test]
    fn membership_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.txt");
        fs::write(&path, "Lecture.PDF\n").unwrap();

        let log = ProgressLog::open(&path).unwrap();
        assert!(log.contains("Lecture.PDF"));
        assert!(!log.contains("lecture.pdf"));
    }

    #[test]
    fn duplicate_record_appends_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.txt");

        let mut log = ProgressLog::open(&path).unwrap();
        log.record("a.pdf").unwrap();
        log.record("a.pdf").unwrap();
        drop(log);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("a.pdf").count(), 1);
    }
}
