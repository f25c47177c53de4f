//! Article body extraction
//!
//! Pulls readable text out of heterogeneous news page layouts using an
//! ordered list of structural selectors. The first selector matching any
//! element wins — a greedy fallback that trades precision for resilience
//! across sites.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Selectors tried in order; first match wins
const BODY_SELECTORS: [&str; 6] = [
    "article p",
    ".article-body p",
    ".story-body p",
    ".content p",
    "main p",
    "p",
];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new("<[^>]*>").expect("valid tag pattern"));

/// Extract body text from an article page, cleaned and truncated to
/// `max_chars`. Returns an empty string when no selector matches anything,
/// so the caller can fall back to the feed entry's own snippet.
pub fn extract_body_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    for selector in BODY_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
    {
        let mut matches = document.select(&selector).peekable();
        if matches.peek().is_some() {
            let joined = matches
                .map(|el| el.text().collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join(" ");
            return truncate_chars(&clean_text(&joined), max_chars);
        }
    }

    String::new()
}

/// Strip markup and collapse all whitespace runs into single spaces
pub fn clean_text(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a character boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============================================================================
// Tests
// ============================================================================
