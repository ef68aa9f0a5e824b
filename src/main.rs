//! narod-migrate: moves a static personal site off its legacy host.
//!
//! The crate covers the whole migration: mirroring every referenced file
//! with resumable downloads, localizing document links in the landing page,
//! retargeting leftover legacy URLs at the new domain, and auditing which
//! page references the manifest cannot serve.
//!
//! Code structure:
//! - `base_system`: configuration and logging infrastructure
//! - `download`: manifest loading, progress log, the batch fetcher
//! - `rewrite`: the regex page rewriters and the reference audit

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

mod base_system;
mod download;
mod rewrite;

use base_system::config::load_or_create;
use base_system::context::Config;
use base_system::logging::{LogOptions, LogSystem};
use download::fetcher::BatchFetcher;
use download::manifest::{ManifestEntry, load_manifest};
use download::models::{FetchReport, FetcherOptions};
use rewrite::audit::audit_references;
use rewrite::local_links::LinkLocalizer;
use rewrite::retarget::Retargeter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "narod-migrate")]
#[command(about = "Migration toolkit for a static site leaving its legacy host")]
struct Cli {
    /// Enable debug log output
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Print version information and exit
    #[arg(long, default_value_t = false)]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download every manifest file, resuming partial transfers (the default)
    Fetch,
    /// Localize legacy-host document links and fix known typos in the landing page
    FixLinks,
    /// Point remaining legacy-domain links at the new domain
    Retarget,
    /// Report page references the manifest cannot serve
    Audit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("narod-migrate v{}", VERSION);
        return Ok(());
    }

    let log = init_logging(cli.debug)?;
    let config = load_or_create::<Config>(None).context("load configuration")?;

    match cli.command.unwrap_or(Command::Fetch) {
        Command::Fetch => run_fetch(&config, &log.cancel_flag()),
        Command::FixLinks => run_fix_links(&config),
        Command::Retarget => run_retarget(&config),
        Command::Audit => run_audit(&config),
    }
}

fn init_logging(debug: bool) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color: true,
        console: true,
    };
    LogSystem::init(opts).context("initialize logging")
}

fn run_fetch(config: &Config, cancel: &AtomicBool) -> Result<()> {
    info!(target: "startup", "narod-migrate v{}", VERSION);

    let manifest_path = config.manifest_path();
    let manifest = load_manifest(&manifest_path)
        .with_context(|| format!("read manifest {}", manifest_path.display()))?;
    let mut fetcher = BatchFetcher::new(FetcherOptions::from_config(config))?;

    println!("Total files to download: {}", manifest.len());
    println!("Already downloaded: {}", fetcher.already_recorded());
    println!("{}", "-".repeat(50));

    let report = fetcher.run(&manifest, Some(cancel));

    if report.interrupted {
        println!("\nDownload interrupted; run again to pick up where it stopped");
        return Ok(());
    }
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &FetchReport) {
    println!("\n{}", "=".repeat(50));
    println!("Download summary:");
    println!("  Total files:        {}", report.total);
    println!("  Already downloaded: {}", report.already);
    println!("  Newly downloaded:   {}", report.downloaded);
    println!("  Failed:             {}", report.failed_count());

    if !report.failed.is_empty() {
        println!("\nFailed files:");
        for name in &report.failed {
            println!("  - {}", name);
        }
        println!("\nRun again to retry the failed downloads");
    }
}

fn run_fix_links(config: &Config) -> Result<()> {
    let page_path = Path::new(&config.legacy_page);
    let content =
        fs::read_to_string(page_path).with_context(|| format!("read {}", page_path.display()))?;

    let localizer = LinkLocalizer::new(&config.old_host, &config.site_path)?;
    let fixed = localizer.apply(&content);
    rewrite::write_atomic(page_path, &fixed)?;
    println!("Fixed links and typos in {}", page_path.display());

    // audit right away so missing link targets surface before upload
    println!("\nChecking for missing files...");
    let manifest_path = config.manifest_path();
    let manifest = load_manifest(&manifest_path)
        .with_context(|| format!("read manifest {}", manifest_path.display()))?;
    let report = audit_references(&fixed, &manifest_names(&manifest))?;
    print!("{}", report.summary());
    Ok(())
}

fn run_retarget(config: &Config) -> Result<()> {
    println!("Updating links in website files...");
    println!("{}", "=".repeat(50));

    let retargeter = Retargeter::new(&config.old_host, &config.site_path, &config.new_base_url)?;
    retarget_page(&retargeter, Path::new(&config.legacy_page), false)?;
    retarget_page(&retargeter, Path::new(&config.modern_page), true)?;

    println!("{}", "=".repeat(50));
    println!("Link update complete");
    Ok(())
}

fn retarget_page(retargeter: &Retargeter, path: &Path, adjust_prefixes: bool) -> Result<()> {
    if !path.exists() {
        println!("  {} not found, skipped", path.display());
        return Ok(());
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let (updated, changes) = retargeter.apply(&content, adjust_prefixes);
    if updated != content {
        rewrite::write_atomic(path, &updated)?;
    }
    println!("  Updated {} - {} changes", path.display(), changes);
    Ok(())
}

fn run_audit(config: &Config) -> Result<()> {
    let page_path = Path::new(&config.legacy_page);
    let content =
        fs::read_to_string(page_path).with_context(|| format!("read {}", page_path.display()))?;
    let manifest_path = config.manifest_path();
    let manifest = load_manifest(&manifest_path)
        .with_context(|| format!("read manifest {}", manifest_path.display()))?;

    let report = audit_references(&content, &manifest_names(&manifest))?;
    print!("{}", report.summary());
    Ok(())
}

fn manifest_names(manifest: &[ManifestEntry]) -> Vec<&str> {
    manifest.iter().map(|entry| entry.name.as_str()).collect()
}
