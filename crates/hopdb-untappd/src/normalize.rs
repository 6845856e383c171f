//! Name normalization for search queries and brewery comparison.

use std::sync::OnceLock;

use regex::Regex;

fn wave_dash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[〜~].*$").expect("valid wave-dash regex"))
}

fn series_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"シリーズ.*$").expect("valid series regex"))
}

fn numbered_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)#\d+|Vol\.?\s*\d+|Batch\s*\d+").expect("valid marker regex")
    })
}

fn trailing_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+20\d{2}\s*$").expect("valid year regex"))
}

fn edition_parens_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"（[^）]*版[^）]*）").expect("valid edition regex"))
}

fn edition_dash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-[^-]+編-?$|－[^－]+編－?$").expect("valid edition-dash regex"))
}

/// Strips series and batch noise from a native-script beer name before it is
/// used as a search query: everything after a wave dash or シリーズ marker,
/// `#N` / `Vol.N` / `Batch N` tags, trailing years, and 「〜編」 edition
/// suffixes.
#[must_use]
pub fn clean_beer_name(name: &str) -> String {
    let mut cleaned = name.to_string();
    cleaned = wave_dash_re().replace(&cleaned, "").into_owned();
    cleaned = series_re().replace(&cleaned, "").into_owned();
    cleaned = numbered_marker_re().replace_all(&cleaned, "").into_owned();
    cleaned = trailing_year_re().replace(&cleaned, "").into_owned();
    cleaned = edition_parens_re().replace_all(&cleaned, "").into_owned();
    cleaned = edition_dash_re().replace(&cleaned, "").into_owned();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed != name {
        tracing::debug!(original = name, cleaned = %collapsed, "cleaned beer name");
    }
    collapsed
}

/// Lowercases and drops everything that is not alphanumeric, so that
/// "West Coast Brewing" and "WestCoast brewing" compare equal.
#[must_use]
pub fn normalize_for_comparison(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when `url` points at a concrete beer page rather than a search page.
#[must_use]
pub fn is_beer_page_url(url: &str) -> bool {
    url.contains("/b/")
}

/// True when `url` is a recorded search placeholder, not a real match.
#[must_use]
pub fn is_search_placeholder(url: &str) -> bool {
    url.contains("/search?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_removes_wave_dash_series_info() {
        assert_eq!(clean_beer_name("ゆずエール〜冬季限定〜"), "ゆずエール");
        assert_eq!(clean_beer_name("Citrus Ale~Winter~"), "Citrus Ale");
    }

    #[test]
    fn clean_removes_batch_and_volume_markers() {
        assert_eq!(clean_beer_name("Hazy Dream #12"), "Hazy Dream");
        assert_eq!(clean_beer_name("Hazy Dream Vol. 3"), "Hazy Dream");
        assert_eq!(clean_beer_name("Hazy Dream batch 7"), "Hazy Dream");
    }

    #[test]
    fn clean_removes_trailing_year() {
        assert_eq!(clean_beer_name("Harvest Ale 2025"), "Harvest Ale");
        // A year mid-name stays.
        assert_eq!(clean_beer_name("2001 Space Beer"), "2001 Space Beer");
    }

    #[test]
    fn clean_removes_edition_suffixes() {
        assert_eq!(clean_beer_name("限定ビール-ラガー編-"), "限定ビール");
        assert_eq!(clean_beer_name("記念ビール（特別版）"), "記念ビール");
    }

    #[test]
    fn clean_collapses_whitespace() {
        assert_eq!(clean_beer_name("Hazy   Dream  IPA"), "Hazy Dream IPA");
        assert_eq!(clean_beer_name("Plain Name"), "Plain Name");
    }

    #[test]
    fn normalization_drops_case_and_punctuation() {
        assert_eq!(normalize_for_comparison("West Coast Brewing"), "westcoastbrewing");
        assert_eq!(normalize_for_comparison("Y.MARKET"), "ymarket");
        assert_eq!(normalize_for_comparison(""), "");
    }

    #[test]
    fn url_kind_checks() {
        assert!(is_beer_page_url("https://untappd.com/b/some-beer/123"));
        assert!(!is_beer_page_url("https://untappd.com/search?q=x"));
        assert!(is_search_placeholder("https://untappd.com/search?q=x"));
        assert!(!is_search_placeholder("https://untappd.com/b/some-beer/123"));
    }
}
