//! Utility functions and helpers.

pub mod http;

use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Resolve a potentially relative href against a base URL.
///
/// Returns `None` for hrefs that cannot point at another page: empty
/// values, in-page anchors, `javascript:` pseudo-URLs and anything that
/// does not resolve to http(s).
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if href
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
    {
        return None;
    }

    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` grapheme clusters, appending `...` when cut.
pub fn truncate_graphemes(s: &str, max: usize) -> String {
    let mut graphemes = s.grapheme_indices(true);
    match graphemes.nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
