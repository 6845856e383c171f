//! Small helpers over the `scraper` DOM types.

use scraper::{ElementRef, Selector};

use crate::error::ScraperError;

/// Compiles a CSS selector, surfacing the selector text on failure.
pub(crate) fn selector(s: &str) -> Result<Selector, ScraperError> {
    Selector::parse(s).map_err(|e| ScraperError::Selector {
        selector: s.to_owned(),
        reason: format!("{e:?}"),
    })
}

/// Concatenated, whitespace-trimmed text of an element.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trimmed, non-empty text segments of an element, in document order.
pub(crate) fn text_parts(el: ElementRef<'_>) -> Vec<String> {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Resolves `href` against a site origin: absolute URLs pass through,
/// root-relative paths are prefixed, and bare paths get a slash.
pub(crate) fn absolutize(origin: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_owned()
    } else if let Some(path) = href.strip_prefix('/') {
        format!("{origin}/{path}")
    } else {
        format!("{origin}/{href}")
    }
}
