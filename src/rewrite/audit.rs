//! Checks which `files/` references in a page the manifest can actually
//! serve. Comparison is case-insensitive so renames that only changed
//! letter case are reported separately from genuinely missing files.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use regex::Regex;

use super::RewriteError;

const MISMATCH_PRINT_LIMIT: usize = 10;
const MISSING_PRINT_LIMIT: usize = 20;

#[derive(Debug, Default)]
pub struct AuditReport {
    pub refs_total: usize,
    pub available_total: usize,
    /// `(reference as written, name the manifest actually has)`
    pub case_mismatches: Vec<(String, String)>,
    pub missing: Vec<String>,
}

impl AuditReport {
    #[allow(dead_code)]
    pub fn is_clean(&self) -> bool {
        self.case_mismatches.is_empty() && self.missing.is_empty()
    }

    /// Human-readable report, long lists truncated with a remainder count.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total file references: {}", self.refs_total);
        let _ = writeln!(out, "Total files in manifest: {}", self.available_total);

        if !self.case_mismatches.is_empty() {
            let _ = writeln!(
                out,
                "\nFound {} case mismatches:",
                self.case_mismatches.len()
            );
            for (reference, actual) in self.case_mismatches.iter().take(MISMATCH_PRINT_LIMIT) {
                let _ = writeln!(out, "  page: {reference} -> manifest: {actual}");
            }
            if self.case_mismatches.len() > MISMATCH_PRINT_LIMIT {
                let _ = writeln!(
                    out,
                    "  ... and {} more",
                    self.case_mismatches.len() - MISMATCH_PRINT_LIMIT
                );
            }
        }

        if self.missing.is_empty() {
            let _ = writeln!(out, "\nAll referenced files are present in the manifest");
        } else {
            let _ = writeln!(
                out,
                "\nFound {} files referenced but missing from the manifest:",
                self.missing.len()
            );
            for name in self.missing.iter().take(MISSING_PRINT_LIMIT) {
                let _ = writeln!(out, "  - {name}");
            }
            if self.missing.len() > MISSING_PRINT_LIMIT {
                let _ = writeln!(
                    out,
                    "  ... and {} more",
                    self.missing.len() - MISSING_PRINT_LIMIT
                );
            }
        }

        out
    }
}

/// Collects every `href="files/…"` reference in `content`, deduped in
/// first-seen order, and buckets each against the manifest names.
pub fn audit_references(content: &str, names: &[&str]) -> Result<AuditReport, RewriteError> {
    let pattern = Regex::new(r#"href="files/([^"]+)""#)?;

    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for caps in pattern.captures_iter(content) {
        let reference = caps[1].to_string();
        if seen.insert(reference.clone()) {
            refs.push(reference);
        }
    }

    // on duplicate lowercased names the later manifest entry wins
    let mut by_lower = HashMap::new();
    for name in names {
        by_lower.insert(name.to_lowercase(), *name);
    }

    let mut report = AuditReport {
        refs_total: refs.len(),
        available_total: names.len(),
        ..AuditReport::default()
    };
    for reference in refs {
        match by_lower.get(&reference.to_lowercase()) {
            Some(actual) if *actual == reference => {}
            Some(actual) => report
                .case_mismatches
                .push((reference, (*actual).to_string())),
            None => report.missing.push(reference),
        }
    }
    report.case_mismatches.sort();
    report.missing.sort();

    Ok(report)
}
