//! Splices the entries of several feed documents into the first one.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Returned when there is nothing to merge.
pub const EMPTY_FEED: &str = "<?xml version='1.0' encoding='UTF-8'?><feed xmlns='http://www.w3.org/2005/Atom'><title>Empty Feed</title></feed>";

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry>.*?</entry>").expect("valid regex"));
static FEED_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</feed\s*>").expect("valid regex"));

/// Byte ranges of every `<entry>...</entry>` span, in document order.
///
/// Matching is textual: case-sensitive, non-greedy, across newlines.
/// Entries whose opening tag carries attributes are not recognised.
pub fn entry_spans(document: &str) -> Vec<Range<usize>> {
    ENTRY_RE.find_iter(document).map(|m| m.range()).collect()
}

/// Text of every entry span, in document order.
pub fn extract_entries(document: &str) -> Vec<&str> {
    ENTRY_RE.find_iter(document).map(|m| m.as_str()).collect()
}

/// Merge raw feed documents into one.
///
/// The first document is the base. Entries from the rest are appended, in
/// input order, just before the base's first `</feed>`. Without such a tag
/// they are appended to the end of the text instead. A single document is
/// returned untouched.
pub fn merge_feeds<S: AsRef<str>>(documents: &[S]) -> String {
    let (base, rest) = match documents.split_first() {
        Some((base, rest)) => (base.as_ref(), rest),
        None => return EMPTY_FEED.to_string(),
    };

    if rest.is_empty() {
        return base.to_string();
    }

    let entries: Vec<&str> = rest
        .iter()
        .flat_map(|doc| extract_entries(doc.as_ref()))
        .collect();

    if entries.is_empty() {
        debug!("No entries found in {} additional feed(s), keeping base feed", rest.len());
        return base.to_string();
    }

    debug!("Merging {} entries from {} additional feed(s)", entries.len(), rest.len());

    let block = entries.join("\n");

    match FEED_CLOSE_RE.find(base) {
        Some(close) => {
            let mut merged = String::with_capacity(base.len() + block.len() + 2);
            merged.push_str(&base[..close.start()]);
            merged.push('\n');
            merged.push_str(&block);
            merged.push('\n');
            merged.push_str(&base[close.start()..]);
            merged
        }
        None => {
            warn!("Could not find closing </feed> tag in base feed, appending entries at the end");
            format!("{}\n{}", base, block)
        }
    }
}
