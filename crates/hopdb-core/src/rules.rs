//! Enrichment rule data: beer-style suffixes and the alias stop-word set.
//!
//! Both lists are hand-curated and locale-specific, so they live in a YAML
//! data file (`config/enrichment.yaml`) rather than in code. Compiled-in
//! defaults cover the case where the file is absent.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

const DEFAULT_STYLE_SUFFIXES: &[&str] = &[
    "West Coast IPA",
    "Imperial Stout",
    "Session IPA",
    "Triple IPA",
    "Double IPA",
    "Fruit Beer",
    "Barleywine",
    "Hazy IPA",
    "Pale Ale",
    "DDH IPA",
    "TDH IPA",
    "Pilsner",
    "Gueuze",
    "Saison",
    "Lambic",
    "NEIPA",
    "Porter",
    "Stout",
    "Lager",
    "Wheat",
    "DIPA",
    "TIPA",
    "Gose",
    "Sour",
    "IPA",
    "Ale",
];

const DEFAULT_ALIAS_STOP_WORDS: &[&str] = &[
    "the", "and", "beer", "brewing", "brewery", "company", "craft", "black", "white", "red",
    "blue", "green", "gold", "west", "east", "north", "south", "new", "old", "big", "little",
];

/// Name suffixes stripped when synthesizing brewery aliases.
const BREWERY_NAME_SUFFIXES: &[&str] = &[" Brewing", " Brewery", " Beer", " Co.", " Company"];

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    style_suffixes: Vec<String>,
    #[serde(default)]
    alias_stop_words: Vec<String>,
}

/// Loaded enrichment rules. Suffixes are held longest-first so a single
/// strip pass removes the most specific style name.
#[derive(Debug, Clone)]
pub struct EnrichmentRules {
    style_suffixes: Vec<String>,
    alias_stop_words: HashSet<String>,
}

impl Default for EnrichmentRules {
    fn default() -> Self {
        Self::from_lists(
            DEFAULT_STYLE_SUFFIXES.iter().map(|s| (*s).to_string()),
            DEFAULT_ALIAS_STOP_WORDS.iter().map(|s| (*s).to_string()),
        )
    }
}

impl EnrichmentRules {
    fn from_lists<S, W>(suffixes: S, stop_words: W) -> Self
    where
        S: IntoIterator<Item = String>,
        W: IntoIterator<Item = String>,
    {
        let mut style_suffixes: Vec<String> = suffixes.into_iter().collect();
        // Longest-first so "Imperial Stout" wins over "Stout".
        style_suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
        let alias_stop_words = stop_words
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect::<HashSet<_>>();
        Self {
            style_suffixes,
            alias_stop_words,
        }
    }

    /// Load rules from a YAML file, substituting defaults when the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RulesFileIo {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: RulesFile = serde_yaml::from_str(&content)?;
        Ok(Self::from_lists(file.style_suffixes, file.alias_stop_words))
    }

    /// Style suffixes in longest-first order.
    #[must_use]
    pub fn style_suffixes(&self) -> &[String] {
        &self.style_suffixes
    }

    /// Strips a trailing style suffix (ASCII-case-insensitive, longest
    /// first). Returns `None` when no suffix matches or the remainder is
    /// empty.
    ///
    /// At most one suffix is removed; applying the function to its own output
    /// yields the same string unless the base name itself ends in a style.
    #[must_use]
    pub fn strip_style_suffix(&self, beer_name: &str) -> Option<String> {
        for suffix in &self.style_suffixes {
            // The suffixes are ASCII, so an ASCII-case-insensitive match
            // implies the tail has exactly the suffix's byte length. Names
            // can hold multibyte text; the boundary check keeps the split
            // on a valid character.
            let Some(cut) = beer_name.len().checked_sub(suffix.len() + 1) else {
                continue;
            };
            if !beer_name.is_char_boundary(cut) {
                continue;
            }
            let (head, tail) = beer_name.split_at(cut);
            if !tail.starts_with(' ') || !tail[1..].eq_ignore_ascii_case(suffix) {
                continue;
            }
            let stripped = head.trim();
            if stripped.is_empty() {
                return None;
            }
            return Some(stripped.to_string());
        }
        None
    }

    /// True when `candidate` is disqualified as a brewery alias: a stop word,
    /// a single digit, or shorter than three characters after trimming.
    #[must_use]
    pub fn is_alias_stop_word(&self, candidate: &str) -> bool {
        let trimmed = candidate.trim();
        if trimmed.chars().count() < 3 {
            return true;
        }
        self.alias_stop_words.contains(&trimmed.to_lowercase())
    }

    /// Generates aliases for a brewery: suffix-stripped base names plus the
    /// first token of multi-token names, filtered through the stop-word set.
    /// The native name, when given, is carried as an alias unfiltered by the
    /// latin stop-word list (it still must clear the length floor).
    #[must_use]
    pub fn generate_aliases(
        &self,
        name_latin: Option<&str>,
        name_native: Option<&str>,
    ) -> Vec<String> {
        let mut aliases: Vec<String> = Vec::new();
        let mut push = |candidate: &str| {
            let trimmed = candidate.trim();
            if !self.is_alias_stop_word(trimmed)
                && !aliases.iter().any(|a| a.eq_ignore_ascii_case(trimmed))
            {
                aliases.push(trimmed.to_string());
            }
        };

        if let Some(name) = name_latin {
            let mut base = name.to_string();
            for suffix in BREWERY_NAME_SUFFIXES {
                if base.ends_with(suffix) {
                    base = base[..base.len() - suffix.len()].trim().to_string();
                    push(&base);
                }
            }
            let words: Vec<&str> = base.split_whitespace().collect();
            if words.len() > 1 {
                push(words[0]);
            }
        }

        if let Some(native) = name_native {
            let trimmed = native.trim();
            if trimmed.chars().count() >= 3 && !aliases.iter().any(|a| a == trimmed) {
                aliases.push(trimmed.to_string());
            }
        }

        aliases
    }
}
