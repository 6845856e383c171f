use serde::Deserialize;

/// The model's decomposition of one product title. All four name fields are
/// nullable; `is_bundle` marks variety packs, merchandise, and anything else
/// that is not a single beer.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NameExtraction {
    pub brewery_name_native: Option<String>,
    pub brewery_name_latin: Option<String>,
    pub beer_name_native: Option<String>,
    pub beer_name_latin: Option<String>,
    #[serde(default)]
    pub is_bundle: bool,
}

impl NameExtraction {
    /// True if the model produced at least one usable name.
    #[must_use]
    pub fn has_any_name(&self) -> bool {
        self.brewery_name_native.is_some()
            || self.brewery_name_latin.is_some()
            || self.beer_name_native.is_some()
            || self.beer_name_latin.is_some()
    }
}

/// Strips a leading/trailing markdown code fence. Models without a JSON
/// response mode tend to wrap their output in ```json blocks.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}
