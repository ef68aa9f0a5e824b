//! Rewrites the legacy landing page to reference the local mirror.
//!
//! Document links that point at the old host (or are bare relative names)
//! become `files/…` paths, the remotely hosted profile photo becomes the
//! local copy, and a short table of known typos is corrected in place.

use regex::{Captures, Regex};

use super::RewriteError;

const PROFILE_IMAGE: &str = "abdikamalov_profile.jpg";
const LEGACY_IMAGE: &str = "image004.jpg";

pub struct LinkLocalizer {
    host_rules: Vec<Regex>,
    bare_doc: Regex,
    image_remote: Regex,
    image_bare: Regex,
    typos: Vec<(Regex, &'static str)>,
}

impl LinkLocalizer {
    pub fn new(old_host: &str, site_path: &str) -> Result<Self, RewriteError> {
        let host = regex::escape(old_host);
        let site = regex::escape(site_path);

        // most specific first: the site subdirectory, then the host root
        let host_rules = vec![
            Regex::new(&format!(
                r#"(?i)href="https?://[^"]*{host}/{site}/([^"]+\.(?:pdf|doc|docx|htm))""#
            ))?,
            Regex::new(&format!(
                r#"(?i)href="https?://[^"]*{host}/([^"]+\.(?:pdf|doc|docx|htm))""#
            ))?,
        ];
        let bare_doc = Regex::new(r#"(?i)href="([^"]+\.(?:pdf|doc|docx|htm))""#)?;
        let image_remote = Regex::new(&format!(
            r#"src="https?://[^"]*{host}/{}""#,
            regex::escape(LEGACY_IMAGE)
        ))?;
        let image_bare = Regex::new(&format!(r#"src="{}""#, regex::escape(LEGACY_IMAGE)))?;

        let typos = vec![
            (Regex::new(r"(?i)\bkarakalpk\b")?, "karakalpak"),
            (Regex::new(r"(?i)\bkaralpak\b")?, "karakalpak"),
            (Regex::new(r"\bАбдикамалов\b")?, "Абдыкамалов"),
            (Regex::new(r"(?i)\bлитратура\b")?, "литература"),
            (Regex::new(r"\bадебият\b")?, "әдебият"),
            (Regex::new(r"\bқарақалпқ\b")?, "қарақалпақ"),
        ];

        Ok(Self {
            host_rules,
            bare_doc,
            image_remote,
            image_bare,
            typos,
        })
    }

    pub fn apply(&self, content: &str) -> String {
        let mut page = content.to_string();

        for rule in &self.host_rules {
            page = rule.replace_all(&page, r#"href="files/$1""#).into_owned();
        }

        // bare relative names get the files/ prefix, but anything already
        // localized or pointing at a foreign host stays as it is
        page = self
            .bare_doc
            .replace_all(&page, |caps: &Captures| {
                let target = &caps[1];
                if target.contains("://") || target.to_ascii_lowercase().starts_with("files/") {
                    caps[0].to_string()
                } else {
                    format!(r#"href="files/{target}""#)
                }
            })
            .into_owned();

        let local_image = format!(r#"src="{PROFILE_IMAGE}""#);
        page = self
            .image_remote
            .replace_all(&page, local_image.as_str())
            .into_owned();
        page = self
            .image_bare
            .replace_all(&page, local_image.as_str())
            .into_owned();

        for (pattern, fix) in &self.typos {
            page = pattern.replace_all(&page, *fix).into_owned();
        }

        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localizer() -> LinkLocalizer {
        LinkLocalizer::new("abdikamalov.narod.ru", "abdikamalov").unwrap()
    }

    #[test]
    fn absolute_host_links_become_local() {
        let page = concat!(
            r#"<a href="http://www.abdikamalov.narod.ru/abdikamalov/paper.pdf">p</a>"#,
            r#"<a href="HTTPS://abdikamalov.narod.ru/notes.doc">n</a>"#,
        );
        let out = localizer().apply(page);
        assert!(out.contains(r#"href="files/paper.pdf""#));
        assert!(out.contains(r#"href="files/notes.doc""#));
        assert!(!out.contains("narod.ru"));
    }

    #[test]
    fn bare_document_links_get_the_files_prefix() {
        let out = localizer().apply(r#"<a href="article.htm">a</a> <a href="book.docx">b</a>"#);
        assert!(out.contains(r#"href="files/article.htm""#));
        assert!(out.contains(r#"href="files/book.docx""#));
    }

    #[test]
    fn localized_and_foreign_links_stay_untouched() {
        let page = concat!(
            r#"<a href="files/already.pdf">a</a>"#,
            r#"<a href="http://example.org/other.pdf">b</a>"#,
        );
        let out = localizer().apply(page);
        assert!(out.contains(r#"href="files/already.pdf""#));
        assert!(!out.contains("files/files/"));
        assert!(out.contains(r#"href="http://example.org/other.pdf""#));
    }

    #[test]
    fn non_document_links_are_ignored() {
        let page = r#"<a href="photo.jpg">x</a> <a href="page.html">y</a>"#;
        assert_eq!(localizer().apply(page), page);
    }

    #[test]
    fn profile_image_swapped_for_local_copy() {
        let page = concat!(
            r#"<img src="http://abdikamalov.narod.ru/image004.jpg">"#,
            r#"<img src="image004.jpg">"#,
        );
        let out = localizer().apply(page);
        assert_eq!(out.matches(r#"src="abdikamalov_profile.jpg""#).count(), 2);
    }

    #[test]
    fn typo_table_applies_with_case_rules() {
        let out = localizer().apply("Karakalpk and KARALPAK, литратура и Литратура");
        assert_eq!(out, "karakalpak and karakalpak, литература и литература");

        let out = localizer().apply("Абдикамалов жазыўшы, адебият, қарақалпқ");
        assert_eq!(out, "Абдыкамалов жазыўшы, әдебият, қарақалпақ");
    }

    #[test]
    fn typos_inside_longer_words_are_left_alone() {
        let page = "работы Абдикамалова";
        assert_eq!(localizer().apply(page), page);
    }
}
