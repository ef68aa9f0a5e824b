//! Points surviving legacy-domain links at the new self-hosted domain.
//!
//! URL rules run most specific first: the old site subdirectory maps to
//! `files/`, the shared `sh/` area keeps its prefix, anything else with a
//! path lands under `files/`, and bare domain mentions become the new base.
//! Protocol-less copies of each rule catch references written without a
//! scheme. Script tags hosted on the legacy platform are swapped for CDN
//! builds (jQuery UI before jQuery, since every UI tag also names jquery)
//! or dropped entirely.

use regex::{Captures, Regex};

use super::RewriteError;

const JQUERY_CDN: &str =
    r#"<script src="https://cdn.jsdelivr.net/npm/jquery@3.7.1/dist/jquery.min.js"></script>"#;
const JQUERY_UI_CDN: &str =
    r#"<script src="https://cdn.jsdelivr.net/npm/jquery-ui@1.13.2/dist/jquery-ui.min.js"></script>"#;

pub struct Retargeter {
    url_rules: Vec<(Regex, String)>,
    jquery_ui: Regex,
    jquery: Regex,
    legacy_scripts: Regex,
    empty_script: Regex,
}

impl Retargeter {
    pub fn new(old_host: &str, site_path: &str, new_base: &str) -> Result<Self, RewriteError> {
        let host = regex::escape(old_host);
        let site = regex::escape(site_path);
        let new_base = new_base.trim_end_matches('/');
        let new_host = new_base.split("://").nth(1).unwrap_or(new_base);

        let mut url_rules = Vec::new();
        for (scheme, target) in [(r"https?://", new_base), ("", new_host)] {
            url_rules.push((
                Regex::new(&format!(
                    r#"(?i){scheme}(?:www\.)?{host}/{site}/([^"'>\s]+)"#
                ))?,
                format!("{target}/files/$1"),
            ));
            url_rules.push((
                Regex::new(&format!(r#"(?i){scheme}(?:www\.)?{host}/sh/([^"'>\s]+)"#))?,
                format!("{target}/sh/$1"),
            ));
            url_rules.push((
                Regex::new(&format!(
                    r#"(?i){scheme}(?:www\.)?{host}/([^/][^"'>\s]+)"#
                ))?,
                format!("{target}/files/$1"),
            ));
            // bare domain mention; the delimiter is captured and put back
            url_rules.push((
                Regex::new(&format!(r#"(?i){scheme}(?:www\.)?{host}/?(["'>])"#))?,
                format!("{target}$1"),
            ));
        }

        let jquery_ui =
            Regex::new(r#"(?i)<script[^>]*src="[^"]*jquery-ui[^"]*\.js"[^>]*></script>"#)?;
        let jquery = Regex::new(r#"(?i)<script[^>]*src="[^"]*jquery[^"]*\.js"[^>]*></script>"#)?;
        let legacy_scripts = Regex::new(&format!(
            r#"(?i)<script[^>]*src="[^"]*{}[^"]*\.js"[^>]*></script>"#,
            regex::escape(apex_domain(old_host))
        ))?;
        let empty_script = Regex::new(r#"<script[^>]*>\s*</script>\s*\n?"#)?;

        Ok(Self {
            url_rules,
            jquery_ui,
            jquery,
            legacy_scripts,
            empty_script,
        })
    }

    /// Rewrites one page. `adjust_prefixes` is set for pages served from a
    /// subdirectory, whose relative `files/` and `sh/` paths must climb one
    /// level. Returns the new text and the number of link replacements
    /// (prefix adjustments are not counted).
    pub fn apply(&self, content: &str, adjust_prefixes: bool) -> (String, usize) {
        let mut count = 0usize;
        let mut page = content.to_string();

        for (pattern, replacement) in &self.url_rules {
            page = replace_counted(pattern, &page, replacement, &mut count);
        }

        if adjust_prefixes {
            page = adjust_relative_prefixes(&page);
        }

        page = self
            .jquery_ui
            .replace_all(&page, |caps: &Captures| {
                swap_unless_cdn(caps, JQUERY_UI_CDN, &mut count)
            })
            .into_owned();
        page = self
            .jquery
            .replace_all(&page, |caps: &Captures| {
                swap_unless_cdn(caps, JQUERY_CDN, &mut count)
            })
            .into_owned();
        page = replace_counted(&self.legacy_scripts, &page, "", &mut count);
        // a bare src tag has an empty body too; only bodiless inline
        // scripts are dead weight
        page = self
            .empty_script
            .replace_all(&page, |caps: &Captures| {
                if caps[0].contains("src=") {
                    caps[0].to_string()
                } else {
                    String::new()
                }
            })
            .into_owned();

        (page, count)
    }
}

fn replace_counted(pattern: &Regex, content: &str, replacement: &str, count: &mut usize) -> String {
    let mut hits = 0usize;
    let out = pattern
        .replace_all(content, |caps: &Captures| {
            hits += 1;
            let mut dst = String::new();
            caps.expand(replacement, &mut dst);
            dst
        })
        .into_owned();
    *count += hits;
    out
}

fn swap_unless_cdn(caps: &Captures, cdn_tag: &str, count: &mut usize) -> String {
    let tag = &caps[0];
    if tag.contains("jsdelivr") {
        tag.to_string()
    } else {
        *count += 1;
        cdn_tag.to_string()
    }
}

/// Relative paths in a page served from a subdirectory must point one level
/// up. Collapsed afterwards so a page that already climbs stays put when the
/// rewrite runs twice.
fn adjust_relative_prefixes(content: &str) -> String {
    let mut page = content.replace(r#"href="files/"#, r#"href="../files/"#);
    page = page.replace(r#"href="sh/"#, r#"href="../sh/"#);
    page = page.replace(r#"src="files/"#, r#"src="../files/"#);
    page = page.replace(r#"src="sh/"#, r#"src="../sh/"#);

    page = page.replace(r#"href="../../files/"#, r#"href="../files/"#);
    page = page.replace(r#"href="../../sh/"#, r#"href="../sh/"#);
    page = page.replace(r#"src="../../files/"#, r#"src="../files/"#);
    page = page.replace(r#"src="../../sh/"#, r#"src="../sh/"#);
    page
}

/// Last two labels of the host: the hosting platform's own domain.
fn apex_domain(host: &str) -> &str {
    let mut dots = host.rmatch_indices('.');
    dots.next();
    match dots.next() {
        Some((idx, _)) => &host[idx + 1..],
        None => host,
    }
}
