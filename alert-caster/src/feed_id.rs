//! Addressing a set of feeds by one string, and the cache keys derived from it.

use crate::types::{CasterError, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Joins individually encoded URLs in a multi-feed identifier.
pub const MULTI_FEED_SEPARATOR: &str = "_|||_";

/// Namespace prefix of every feed cache key.
pub const FEED_CACHE_PREFIX: &str = "rss_cache_";

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Strict percent-decoding: malformed escapes and invalid UTF-8 are errors.
pub fn decode_component(value: &str) -> Result<String> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !well_formed {
                return Err(CasterError::InvalidFeedId(format!("malformed escape at byte {}", i)));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| CasterError::InvalidFeedId(e.to_string()))
}

/// Identifier for one or more feed URLs.
pub fn encode_feed_id<S: AsRef<str>>(urls: &[S]) -> String {
    urls.iter()
        .map(|url| encode_component(url.as_ref()))
        .collect::<Vec<_>>()
        .join(MULTI_FEED_SEPARATOR)
}

/// URLs named by an identifier, in their original order.
pub fn decode_feed_id(feed_id: &str) -> Result<Vec<String>> {
    let decoded = decode_component(feed_id)?;

    let urls: Vec<String> = decoded
        .split(MULTI_FEED_SEPARATOR)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        return Err(CasterError::InvalidFeedId("no feed URLs found in feed ID".to_string()));
    }

    Ok(urls)
}

/// Cache key for a URL set: the single URL, or the sorted URLs joined by commas.
pub fn cache_key<S: AsRef<str>>(urls: &[S]) -> String {
    let content = match urls {
        [single] => single.as_ref().to_string(),
        _ => {
            let mut sorted: Vec<&str> = urls.iter().map(AsRef::as_ref).collect();
            sorted.sort_unstable();
            sorted.join(",")
        }
    };
    format!("{}{}", FEED_CACHE_PREFIX, encode_component(&content))
}
