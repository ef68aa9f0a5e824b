//! Data models for the batch fetch flow.

use std::path::PathBuf;
use std::time::Duration;

use crate::base_system::context::Config;

/// Outcome of one manifest pass.
///
/// `already + downloaded + failed.len()` accounts for every entry that was
/// processed; on an interrupted run the remainder was never looked at.
#[derive(Debug, Default, Clone)]
pub struct FetchReport {
    pub total: usize,
    pub already: usize,
    pub downloaded: usize,
    pub failed: Vec<String>,
    pub interrupted: bool,
}

impl FetchReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Everything a [`super::fetcher::BatchFetcher`] needs beyond the manifest.
#[derive(Debug, Clone)]
pub struct FetcherOptions {
    pub base_url: String,
    pub dest_dir: PathBuf,
    pub progress_path: PathBuf,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub entry_delay: Duration,
    pub show_progress: bool,
}

impl FetcherOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            dest_dir: config.files_path(),
            progress_path: config.progress_path(),
            request_timeout: Duration::from_secs(config.request_timeout),
            max_retries: config.max_retries,
            min_backoff: Duration::from_millis(config.min_wait_time),
            max_backoff: Duration::from_millis(config.max_wait_time),
            entry_delay: Duration::from_millis(config.download_delay),
            show_progress: true,
        }
    }
}
