//! Redirect and tracking cleanup for `<link href="...">` values.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Google Alerts wraps every destination in this redirect, entity-encoded
/// as it appears inside feed XML.
pub const GOOGLE_REDIRECT_PREFIX: &str = "https://www.google.com/url?rct=j&amp;sa=t&amp;url=";

/// Start of the tracking parameters Google appends after the destination.
pub const GOOGLE_TRACKING_MARKER: &str = "&amp;ct=ga&amp;cd";

static LINK_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<link[^>]*?href=")([^"]*)(")"#).expect("valid regex"));

#[derive(Debug, Clone)]
pub struct LinkSanitizer {
    redirect_prefix: String,
    tracking_marker: String,
}

impl Default for LinkSanitizer {
    fn default() -> Self {
        Self::new(GOOGLE_REDIRECT_PREFIX, GOOGLE_TRACKING_MARKER)
    }
}

impl LinkSanitizer {
    pub fn new(redirect_prefix: impl Into<String>, tracking_marker: impl Into<String>) -> Self {
        Self {
            redirect_prefix: redirect_prefix.into(),
            tracking_marker: tracking_marker.into(),
        }
    }

    /// Destination URL of a single href value.
    ///
    /// The redirect prefix is removed first (repeatedly, for nested
    /// wrapping), then the value is cut at the tracking marker. Values
    /// matching neither rule come back unchanged.
    pub fn clean_href<'a>(&self, href: &'a str) -> &'a str {
        let mut value = href;

        if !self.redirect_prefix.is_empty() {
            while let Some(rest) = value.strip_prefix(self.redirect_prefix.as_str()) {
                value = rest;
            }
        }

        if !self.tracking_marker.is_empty() {
            if let Some(idx) = value.find(self.tracking_marker.as_str()) {
                value = &value[..idx];
            }
        }

        value
    }

    /// Clean every `<link ... href="...">` in a document in a single pass.
    pub fn sanitize_document<'a>(&self, document: &'a str) -> Cow<'a, str> {
        LINK_HREF_RE.replace_all(document, |caps: &Captures| {
            format!("{}{}{}", &caps[1], self.clean_href(&caps[2]), &caps[3])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRAPPED: &str = "https://www.google.com/url?rct=j&amp;sa=t&amp;url=https://news.example.com/a&amp;ct=ga&amp;cd=xyz&amp;usg=abc";

    #[test]
    fn strips_prefix_then_suffix() {
        let sanitizer = LinkSanitizer::default();
        assert_eq!(sanitizer.clean_href(WRAPPED), "https://news.example.com/a");
        assert_eq!(sanitizer.clean_href("https://plain.example.com/x"), "https://plain.example.com/x");
    }

    #[test]
    fn nested_redirects_are_fully_unwrapped() {
        let sanitizer = LinkSanitizer::default();
        let nested = format!("{}{}", GOOGLE_REDIRECT_PREFIX, WRAPPED);
        assert_eq!(sanitizer.clean_href(&nested), "https://news.example.com/a");
    }

    #[test]
    fn document_pass_touches_only_link_hrefs() {
        let sanitizer = LinkSanitizer::default();
        let doc = format!(
            "<entry><link href=\"{WRAPPED}\"/><content>{WRAPPED}</content></entry>"
        );
        let cleaned = sanitizer.sanitize_document(&doc);
        assert!(cleaned.contains("<link href=\"https://news.example.com/a\"/>"));
        assert!(cleaned.contains(&format!("<content>{WRAPPED}</content>")));
    }

    #[test]
    fn document_pass_is_idempotent() {
        let sanitizer = LinkSanitizer::default();
        let doc = format!(
            "<feed><link rel=\"self\" href=\"https://alerts.example.com/feed\"/>\
             <entry><link rel=\"alternate\" href=\"{WRAPPED}\"/></entry></feed>"
        );
        let once = sanitizer.sanitize_document(&doc).into_owned();
        let twice = sanitizer.sanitize_document(&once).into_owned();
        assert_eq!(once, twice);
    }
}
