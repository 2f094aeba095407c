//! Feed text helpers shared by the merge and annotation stages.

/// XML entity handling
pub mod xml {
    use regex::{Captures, Regex};
    use std::borrow::Cow;
    use std::sync::LazyLock;

    static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"&(?:(amp|lt|gt|quot|apos)|#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6}));")
            .expect("valid regex")
    });

    /// Decode the five predefined XML entities and numeric character
    /// references in one pass. References that do not name a valid
    /// character are kept verbatim.
    pub fn decode_entities(input: &str) -> Cow<'_, str> {
        if !input.contains('&') {
            return Cow::Borrowed(input);
        }

        ENTITY_RE.replace_all(input, |caps: &Captures| {
            if let Some(name) = caps.get(1) {
                return match name.as_str() {
                    "amp" => "&",
                    "lt" => "<",
                    "gt" => ">",
                    "quot" => "\"",
                    _ => "'",
                }
                .to_string();
            }

            let code = match (caps.get(2), caps.get(3)) {
                (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                _ => None,
            };

            code.and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
    }
}

/// URL utilities
pub mod url {
    use super::xml::decode_entities;
    use regex::Regex;
    use std::sync::LazyLock;
    use tracing::debug;

    /// Returned when no host can be recovered at all.
    pub const UNKNOWN_HOST: &str = "unknown";

    static HOST_FALLBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?im)^(?:https?://)?(?:[^@\n]+@)?(?:www\.)?([^:/\n?]+)").expect("valid regex")
    });

    /// Host of a possibly entity-encoded URL.
    ///
    /// Strict parsing is tried first; when that fails (or yields no host) a
    /// heuristic strips scheme, userinfo and `www.` and keeps the label up to
    /// the next `:`, `/` or `?`. Never fails and never returns an empty string.
    pub fn extract_hostname(raw: &str) -> String {
        let decoded = decode_entities(raw.trim());

        if let Ok(parsed) = ::url::Url::parse(&decoded) {
            if let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) {
                return host.to_string();
            }
        }

        debug!("Strict URL parse gave no host for {:?}, using heuristic", raw);

        HOST_FALLBACK_RE
            .captures(&decoded)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_HOST.to_string())
    }

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        match ::url::Url::parse(url_str) {
            Ok(url) => url.scheme() == "http" || url.scheme() == "https",
            Err(_) => false,
        }
    }
}

/// Plain-text extraction for model input
pub mod text {
    use super::xml::decode_entities;
    use regex::Regex;
    use std::sync::LazyLock;

    static CDATA_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid regex"));
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    /// Plain text of an XML/HTML fragment: CDATA unwrapped, entities
    /// decoded, tags removed, whitespace collapsed.
    ///
    /// Entities are decoded before tags are stripped so that escaped HTML
    /// bodies (`type="html"` content) lose their markup too.
    pub fn extract_text(fragment: &str) -> String {
        let unwrapped = CDATA_RE.replace_all(fragment, "$1");
        let decoded = decode_entities(&unwrapped);
        let stripped = TAG_RE.replace_all(&decoded, "");

        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// First `max_chars` characters of `text`.
    pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }
}
