//! Small helpers over the `scraper` DOM types.

use scraper::{ElementRef, Selector};

use crate::error::UntappdError;

/// Compiles a CSS selector, surfacing the selector text on failure.
pub(crate) fn selector(s: &str) -> Result<Selector, UntappdError> {
    Selector::parse(s).map_err(|e| UntappdError::Selector {
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
