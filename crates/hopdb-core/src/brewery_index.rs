//! In-memory lookup over the known-brewery table.
//!
//! Loaded once per run and read-only thereafter. Used by Stage 1 to hand the
//! extraction model a brewery hint and by Stage 2 to seed brewery-scoped
//! searches.

use std::collections::HashMap;

/// One brewery as loaded from the store. `external_url` is the Untappd
/// brewery page when known.
#[derive(Debug, Clone)]
pub struct BreweryRecord {
    pub external_url: Option<String>,
    pub name_latin: Option<String>,
    pub name_native: Option<String>,
    pub aliases: Vec<String>,
}

/// Case-folded index over latin names, native names, and aliases.
#[derive(Debug, Default)]
pub struct BreweryIndex {
    breweries: Vec<BreweryRecord>,
    /// lowercase key → index into `breweries`
    index: HashMap<String, usize>,
}

impl BreweryIndex {
    #[must_use]
    pub fn new(breweries: Vec<BreweryRecord>) -> Self {
        let mut index = HashMap::new();
        for (i, brewery) in breweries.iter().enumerate() {
            if let Some(name) = &brewery.name_latin {
                index.insert(name.to_lowercase(), i);
            }
            if let Some(name) = &brewery.name_native {
                index.insert(name.to_lowercase(), i);
            }
            for alias in &brewery.aliases {
                index.insert(alias.to_lowercase(), i);
            }
        }
        Self { breweries, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.breweries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breweries.is_empty()
    }

    /// Exact case-folded lookup by any indexed name or alias.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&BreweryRecord> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.breweries[i])
    }

    /// Scans a product title for any indexed brewery name or alias.
    ///
    /// Keys shorter than three characters are skipped to avoid accidental
    /// substring hits inside unrelated words.
    #[must_use]
    pub fn find_in_text(&self, text: &str) -> Option<&BreweryRecord> {
        if text.is_empty() {
            return None;
        }
        let haystack = text.to_lowercase();
        // Prefer the longest key so "West Coast Brewing" beats "West Coast".
        let mut best: Option<(usize, usize)> = None;
        for (key, &i) in &self.index {
            if key.chars().count() < 3 {
                continue;
            }
            if haystack.contains(key.as_str()) {
                match best {
                    Some((best_len, _)) if best_len >= key.len() => {}
                    _ => best = Some((key.len(), i)),
                }
            }
        }
        best.map(|(_, i)| &self.breweries[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> BreweryIndex {
        BreweryIndex::new(vec![
            BreweryRecord {
                external_url: Some("https://untappd.com/w/inkhorn-brewing/400000".to_string()),
                name_latin: Some("Inkhorn Brewing".to_string()),
                name_native: Some("インクホーン".to_string()),
                aliases: vec!["Inkhorn".to_string()],
            },
            BreweryRecord {
                external_url: None,
                name_latin: Some("West Coast Brewing".to_string()),
                name_native: None,
                aliases: vec!["West Coast".to_string(), "WCB".to_string()],
            },
        ])
    }

    #[test]
    fn lookup_is_case_folded() {
        let index = sample_index();
        assert!(index.lookup("inkhorn brewing").is_some());
        assert!(index.lookup("INKHORN").is_some());
        assert!(index.lookup("unknown").is_none());
    }

    #[test]
    fn find_in_text_matches_aliases() {
        let index = sample_index();
        let hit = index
            .find_in_text("Theory of Clarity / Inkhorn Brewing 330ml")
            .expect("should match");
        assert_eq!(hit.name_latin.as_deref(), Some("Inkhorn Brewing"));
    }

    #[test]
    fn find_in_text_matches_native_name() {
        let index = sample_index();
        let hit = index
            .find_in_text("インクホーン ウグイス 330ml")
            .expect("should match native name");
        assert_eq!(hit.name_latin.as_deref(), Some("Inkhorn Brewing"));
    }

    #[test]
    fn find_in_text_prefers_longest_key() {
        let index = sample_index();
        let hit = index
            .find_in_text("Hazy Thing / West Coast Brewing")
            .expect("should match");
        assert_eq!(hit.name_latin.as_deref(), Some("West Coast Brewing"));
    }

    #[test]
    fn find_in_text_handles_empty_input() {
        let index = sample_index();
        assert!(index.find_in_text("").is_none());
    }
}
