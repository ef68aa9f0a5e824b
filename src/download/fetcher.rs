//! The batch fetcher: sequential, resumable, idempotent downloads.
//!
//! One [`BatchFetcher`] owns its HTTP client, options and progress log, so
//! independent batches (and tests) never share state. A manifest pass walks
//! the entries in order: names already in the progress log are skipped
//! outright, files already complete on disk are recorded without touching
//! the network, everything else is fetched from the current on-disk offset
//! with an HTTP range request and streamed to disk in small chunks.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONNECTION, HeaderMap, HeaderValue, RANGE};
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::manifest::ManifestEntry;
use super::models::{FetchReport, FetcherOptions};
use super::progress::{self, ProgressReporter};
use super::progress_log::ProgressLog;

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("transfer failed: {0}")]
    Stream(io::Error),
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("interrupted")]
    Interrupted,
}

impl FetchError {
    /// Transient failures are worth an automatic retry; everything else is
    /// final for this pass.
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Stream(_) => true,
            FetchError::Status(code) => {
                code.is_server_error() || *code == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

enum EntryOutcome {
    /// Name was already in the progress log.
    Already,
    /// File was complete on disk, only the log entry was missing.
    Healed,
    Downloaded,
    Failed,
    Interrupted,
}

pub struct BatchFetcher {
    client: Client,
    base: Url,
    progress: ProgressLog,
    opts: FetcherOptions,
}

impl BatchFetcher {
    pub fn new(options: FetcherOptions) -> Result<Self> {
        let base = Url::parse(&options.base_url)
            .with_context(|| format!("invalid base url: {}", options.base_url))?;
        if base.cannot_be_a_base() {
            bail!("base url cannot carry a path: {}", options.base_url);
        }

        fs::create_dir_all(&options.dest_dir)
            .with_context(|| format!("create files dir {}", options.dest_dir.display()))?;
        let progress = ProgressLog::open(&options.progress_path).with_context(|| {
            format!("open progress log {}", options.progress_path.display())
        })?;

        // identity encoding keeps Content-Length and range offsets byte-accurate
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("narod-migrate/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(options.request_timeout)
            .timeout(options.request_timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            client,
            base,
            progress,
            opts: options,
        })
    }

    /// Names recorded as complete before this pass started.
    pub fn already_recorded(&self) -> usize {
        self.progress.len()
    }

    /// One pass over the manifest. Per-file failures are collected, never
    /// propagated; only cancellation ends the pass early.
    pub fn run(&mut self, manifest: &[ManifestEntry], cancel: Option<&AtomicBool>) -> FetchReport {
        let mut report = FetchReport {
            total: manifest.len(),
            ..FetchReport::default()
        };
        let mut reporter = progress::make_reporter(manifest.len(), self.opts.show_progress);

        for (idx, entry) in manifest.iter().enumerate() {
            if is_cancelled(cancel) {
                info!(target: "download", "stop requested, ending the pass");
                report.interrupted = true;
                break;
            }

            debug!(target: "download", "[{}/{}] {}", idx + 1, report.total, entry.name);
            let outcome = self.process_entry(entry, cancel, &reporter);
            match outcome {
                EntryOutcome::Already => report.already += 1,
                EntryOutcome::Healed | EntryOutcome::Downloaded => report.downloaded += 1,
                EntryOutcome::Failed => report.failed.push(entry.name.clone()),
                EntryOutcome::Interrupted => {
                    report.interrupted = true;
                }
            }
            if matches!(outcome, EntryOutcome::Interrupted) {
                break;
            }
            reporter.file_done();

            // courtesy gap between requests against the remote host
            if matches!(outcome, EntryOutcome::Downloaded | EntryOutcome::Failed)
                && idx + 1 < manifest.len()
            {
                thread::sleep(self.opts.entry_delay);
            }
        }

        reporter.finish();
        report
    }

    fn process_entry(
        &mut self,
        entry: &ManifestEntry,
        cancel: Option<&AtomicBool>,
        reporter: &ProgressReporter,
    ) -> EntryOutcome {
        if self.progress.contains(&entry.name) {
            debug!(target: "download", "{} already recorded, skipping", entry.name);
            return EntryOutcome::Already;
        }

        let path = self.opts.dest_dir.join(&entry.name);
        // healing needs a real artifact; a zero-size entry with no file on
        // disk is still fetched so the empty file gets created
        if let Some(expected) = entry.size
            && let Ok(meta) = fs::metadata(&path)
            && meta.len() >= expected
        {
            info!(target: "download", "{} already complete on disk", entry.name);
            self.mark_complete(&entry.name);
            return EntryOutcome::Healed;
        }

        info!(target: "download", "downloading {}", entry.name);
        match self.download_with_retry(entry, &path, cancel, reporter) {
            Ok(()) => {
                self.mark_complete(&entry.name);
                EntryOutcome::Downloaded
            }
            Err(FetchError::Interrupted) => {
                info!(target: "download", "{} interrupted, partial kept for resume", entry.name);
                EntryOutcome::Interrupted
            }
            Err(err) => {
                error!(target: "download", "{} failed: {}", entry.name, err);
                EntryOutcome::Failed
            }
        }
    }

    fn download_with_retry(
        &self,
        entry: &ManifestEntry,
        path: &Path,
        cancel: Option<&AtomicBool>,
        reporter: &ProgressReporter,
    ) -> Result<(), FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetch_once(entry, path, cancel, reporter) {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt < self.opts.max_retries => {
                    attempt += 1;
                    warn!(
                        target: "download",
                        "{}: {} (retry {}/{})",
                        entry.name, err, attempt, self.opts.max_retries
                    );
                    self.sleep_backoff(attempt);
                    if is_cancelled(cancel) {
                        return Err(FetchError::Interrupted);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One transfer attempt. The resume offset is re-read from disk every
    /// time, so bytes landed by a failed attempt are never fetched again.
    fn fetch_once(
        &self,
        entry: &ManifestEntry,
        path: &Path,
        cancel: Option<&AtomicBool>,
        reporter: &ProgressReporter,
    ) -> Result<(), FetchError> {
        let resume = file_len(path);
        let url = resource_url(&self.base, &entry.name);

        let mut request = self.client.get(url);
        if resume > 0 {
            request = request.header(RANGE, format!("bytes={}-", resume));
            debug!(target: "download", "resuming {} from byte {}", entry.name, resume);
        }
        let mut resp = request.send()?;

        let status = resp.status();
        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            return Err(FetchError::Status(status));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_at(parent, source))?;
        }

        // Append only when the server honored the range; a 200 reply to a
        // ranged request carries the whole body, so start over from zero
        // instead of gluing a full copy onto the partial.
        let (file, start) = if resume > 0 && status == StatusCode::PARTIAL_CONTENT {
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .map_err(|source| io_at(path, source))?;
            (file, resume)
        } else {
            if resume > 0 {
                warn!(
                    target: "download",
                    "server ignored the range for {}, restarting from byte 0",
                    entry.name
                );
            }
            (File::create(path).map_err(|source| io_at(path, source))?, 0)
        };

        let total = resp.content_length().map(|remaining| start + remaining);
        let bar = reporter.start_file(&entry.name, start, total);
        let streamed = stream_body(&mut resp, file, path, bar.as_ref(), cancel);
        reporter.finish_file(bar);
        let written = start + streamed?;

        if let Some(expected) = entry.size
            && written != expected
        {
            warn!(
                target: "download",
                "{}: final size {} differs from manifest ({})",
                entry.name, written, expected
            );
        }
        Ok(())
    }

    fn mark_complete(&mut self, name: &str) {
        // The completion stands either way; a lost log line only means the
        // next run re-verifies this file by size.
        if let Err(err) = self.progress.record(name) {
            error!(
                target: "download",
                "could not record {} in {}: {}",
                name,
                self.progress.path().display(),
                err
            );
        }
    }

    fn sleep_backoff(&self, attempt: u32) {
        let min_ms = self.opts.min_backoff.as_millis() as u64;
        let max_ms = self.opts.max_backoff.as_millis() as u64;
        let factor = 1u64 << attempt.saturating_sub(1).min(10);
        let wait = min_ms.saturating_mul(factor).min(max_ms);
        if wait > 0 {
            thread::sleep(Duration::from_millis(wait));
        }
    }
}

/// Streams the body to `file` in fixed-size chunks, honoring the cancel flag
/// between chunks. Returns the number of bytes written by this attempt.
fn stream_body(
    resp: &mut Response,
    mut file: File,
    path: &Path,
    bar: Option<&ProgressBar>,
    cancel: Option<&AtomicBool>,
) -> Result<u64, FetchError> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut streamed = 0u64;
    loop {
        if is_cancelled(cancel) {
            // keep what already landed; the next run resumes from here
            return Err(FetchError::Interrupted);
        }
        let n = resp.read(&mut buf).map_err(FetchError::Stream)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|source| io_at(path, source))?;
        streamed += n as u64;
        if let Some(bar) = bar {
            bar.inc(n as u64);
        }
    }
    file.sync_all().map_err(|source| io_at(path, source))?;
    Ok(streamed)
}

/// `base + name`, percent-encoding path-unsafe characters while keeping `/`
/// as a real segment separator.
fn resource_url(base: &Url, name: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(name.split('/'));
    }
    url
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

fn io_at(path: &Path, source: io::Error) -> FetchError {
    FetchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.map(|c| c.load(Ordering::Relaxed)).unwrap_or(false)
}
