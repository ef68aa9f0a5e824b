//! Batch download pipeline.
//!
//! Submodules:
//! - `models`       — option and report types shared across the pipeline
//! - `manifest`     — the JSON list of files to mirror
//! - `progress_log` — append-only record of completed names
//! - `progress`     — CLI progress bars
//! - `fetcher`      — the sequential resumable fetch loop

pub mod fetcher;
pub mod manifest;
pub mod models;
pub mod progress;
pub mod progress_log;
