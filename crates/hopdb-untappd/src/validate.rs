//! Brewery validation for search-result candidates.

use crate::normalize::normalize_for_comparison;

/// Checks a candidate's brewery text against the expected brewery.
///
/// Comparison is case-folded and stripped of punctuation, and a substring
/// match in either direction counts, so "Shiga Kogen" accepts
/// "Shiga Kogen Beer (Tamamura-Honten)". Known aliases of the expected
/// brewery are tried the same way. An empty expectation accepts anything.
#[must_use]
pub fn brewery_matches(candidate_text: &str, expected: &str, aliases: &[String]) -> bool {
    if expected.is_empty() {
        return true;
    }
    let candidate = normalize_for_comparison(candidate_text);
    if candidate.is_empty() {
        return false;
    }

    let expected_norm = normalize_for_comparison(expected);
    if !expected_norm.is_empty()
        && (candidate.contains(&expected_norm) || expected_norm.contains(&candidate))
    {
        return true;
    }

    for alias in aliases {
        let alias_norm = normalize_for_comparison(alias);
        if !alias_norm.is_empty()
            && (candidate.contains(&alias_norm) || alias_norm.contains(&candidate))
        {
            return true;
        }
    }

    tracing::debug!(candidate_text, expected, "brewery validation failed");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_passes() {
        assert!(brewery_matches("Inkhorn Brewing", "Inkhorn Brewing", &[]));
    }

    #[test]
    fn match_ignores_case_and_punctuation() {
        assert!(brewery_matches("Y.MARKET BREWING", "Y Market Brewing", &[]));
    }

    #[test]
    fn substring_matches_in_both_directions() {
        assert!(brewery_matches(
            "Shiga Kogen Beer (Tamamura-Honten)",
            "Shiga Kogen",
            &[]
        ));
        assert!(brewery_matches("Uchu", "Uchu Brewing", &[]));
    }

    #[test]
    fn alias_rescues_a_renamed_brewery() {
        let aliases = vec!["Wakasaimo".to_string()];
        assert!(brewery_matches("Wakasaimo Honpo", "鬼伝説", &aliases));
        assert!(!brewery_matches("Wakasaimo Honpo", "鬼伝説", &[]));
    }

    #[test]
    fn empty_expectation_accepts_anything() {
        assert!(brewery_matches("Whoever Brewing", "", &[]));
    }

    #[test]
    fn unrelated_brewery_is_rejected() {
        assert!(!brewery_matches("Totally Different Co", "Inkhorn Brewing", &[]));
    }

    #[test]
    fn empty_candidate_is_rejected() {
        assert!(!brewery_matches("", "Inkhorn Brewing", &[]));
        assert!(!brewery_matches("・・・", "Inkhorn Brewing", &[]));
    }
}
