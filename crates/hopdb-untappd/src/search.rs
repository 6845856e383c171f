//! Beer search against the external catalog site.
//!
//! The site has no public API, so matching goes through its HTML search
//! page. A single query is rarely enough for Japanese craft beers, so
//! [`UntappdClient::find_beer`] runs an ordered cascade of query shapes and
//! only accepts a candidate whose brewery text survives validation.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use scraper::Html;

use hopdb_core::EnrichmentRules;

use crate::error::UntappdError;
use crate::html::{absolutize, element_text, selector};
use crate::normalize::clean_beer_name;
use crate::validate::brewery_matches;

pub const DEFAULT_BASE_URL: &str = "https://untappd.com";

/// Sent on every request; the site serves a bot-challenge page to the
/// default reqwest agent.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Only the first few search results are worth validating; below that the
/// relevance drops off sharply.
const RESULTS_TO_CHECK: usize = 3;

/// Names driving one search cascade. `brewery_aliases` widens validation,
/// `brewery_page_hint` enables the brewery-scoped first attempt.
#[derive(Debug, Default)]
pub struct BeerQuery<'a> {
    pub beer_latin: Option<&'a str>,
    pub beer_native: Option<&'a str>,
    pub brewery: Option<&'a str>,
    pub brewery_aliases: &'a [String],
    pub brewery_page_hint: Option<&'a str>,
}

/// Result of a search cascade. A placeholder records the query URL so a later
/// run can tell "searched and missed" from "never searched".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Match(String),
    Placeholder(String),
}

impl SearchOutcome {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Match(url) | Self::Placeholder(url) => url,
        }
    }
}

struct SearchHit {
    href: String,
    brewery_text: String,
}

/// HTTP client for the external catalog site.
pub struct UntappdClient {
    client: Client,
    base_url: String,
}

impl UntappdClient {
    /// # Errors
    ///
    /// Returns `UntappdError::Http` if the underlying client cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, UntappdError> {
        Self::build(DEFAULT_BASE_URL.to_string(), timeout_secs)
    }

    /// Uses `base_url` instead of the production site. Lets tests point the
    /// client at a local mock server.
    ///
    /// # Errors
    ///
    /// Returns `UntappdError::Http` if the underlying client cannot be built.
    pub fn with_base_url(base_url: String) -> Result<Self, UntappdError> {
        Self::build(base_url, 10)
    }

    fn build(base_url: String, timeout_secs: u64) -> Result<Self, UntappdError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}",
            self.base_url,
            utf8_percent_encode(query, NON_ALPHANUMERIC)
        )
    }

    pub(crate) async fn fetch_html(&self, url: &str) -> Result<String, UntappdError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UntappdError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Runs the search cascade for one product.
    ///
    /// Attempt order: brewery-scoped listing (when a hint URL exists), then
    /// `beer brewery`, beer alone, suffix-stripped variants with and without
    /// the brewery, and finally the native-script name (cleaned, then raw).
    /// A fetch or parse failure in one attempt logs and falls through to the
    /// next. When every attempt misses, the primary query URL comes back as
    /// a [`SearchOutcome::Placeholder`].
    pub async fn find_beer(
        &self,
        rules: &EnrichmentRules,
        query: &BeerQuery<'_>,
    ) -> SearchOutcome {
        let expected = query.brewery.unwrap_or("");
        let mut primary_query = String::new();

        if let (Some(hint), Some(beer)) = (query.brewery_page_hint, query.beer_latin) {
            tracing::info!(brewery_url = hint, beer, "brewery-scoped search");
            if let Some(url) = self.search_brewery_listing(hint, beer).await {
                return SearchOutcome::Match(url);
            }
        }

        if let Some(beer) = query.beer_latin {
            let full_query = match query.brewery {
                Some(brewery) => format!("{beer} {brewery}"),
                None => beer.to_string(),
            };
            primary_query.clone_from(&full_query);

            if let Some(url) = self
                .search_beer(&full_query, expected, query.brewery_aliases)
                .await
            {
                return SearchOutcome::Match(url);
            }

            // A bare style name like "Pale Ale" matches anything, so the
            // beer-only attempt needs a brewery to validate against.
            if query.brewery.is_some() {
                if let Some(url) = self.search_beer(beer, expected, query.brewery_aliases).await {
                    return SearchOutcome::Match(url);
                }
            }

            if let Some(stripped) = rules.strip_style_suffix(beer) {
                let stripped_query = match query.brewery {
                    Some(brewery) => format!("{stripped} {brewery}"),
                    None => stripped.clone(),
                };
                if let Some(url) = self
                    .search_beer(&stripped_query, expected, query.brewery_aliases)
                    .await
                {
                    return SearchOutcome::Match(url);
                }
                if query.brewery.is_some() {
                    if let Some(url) = self
                        .search_beer(&stripped, expected, query.brewery_aliases)
                        .await
                    {
                        return SearchOutcome::Match(url);
                    }
                }
            }
        }

        if let Some(native) = query.beer_native {
            let cleaned = clean_beer_name(native);
            if !cleaned.is_empty() && cleaned != native {
                let cleaned_query = match query.brewery {
                    Some(brewery) => format!("{cleaned} {brewery}"),
                    None => cleaned.clone(),
                };
                if let Some(url) = self
                    .search_beer(&cleaned_query, expected, query.brewery_aliases)
                    .await
                {
                    return SearchOutcome::Match(url);
                }
            }
            if let Some(url) = self
                .search_beer(native, expected, query.brewery_aliases)
                .await
            {
                return SearchOutcome::Match(url);
            }
            if primary_query.is_empty() {
                primary_query = native.to_string();
            }
        }

        let final_query = {
            let cleaned = clean_beer_name(&primary_query);
            if cleaned.is_empty() {
                primary_query
            } else {
                cleaned
            }
        };
        tracing::info!(query = %final_query, "no direct match, recording search placeholder");
        SearchOutcome::Placeholder(self.search_url(&final_query))
    }

    /// One search attempt: fetch the results page and return the first beer
    /// link among the top hits whose brewery text validates.
    async fn search_beer(
        &self,
        query: &str,
        expected_brewery: &str,
        aliases: &[String],
    ) -> Option<String> {
        let url = self.search_url(query);
        tracing::debug!(query, "searching");
        let body = match self.fetch_html(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(query, error = %e, "search fetch failed, trying next query");
                return None;
            }
        };
        let hits = match parse_search_hits(&body) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(query, error = %e, "search parse failed, trying next query");
                return None;
            }
        };
        for hit in hits {
            if brewery_matches(&hit.brewery_text, expected_brewery, aliases) {
                return Some(absolutize(&self.base_url, &hit.href));
            }
        }
        None
    }

    /// Searches within a known brewery's own beer list. The listing is
    /// already scoped, so the first beer link is taken without brewery
    /// validation.
    async fn search_brewery_listing(&self, brewery_url: &str, beer: &str) -> Option<String> {
        let url = format!(
            "{}/beer?name={}",
            brewery_url.trim_end_matches('/'),
            utf8_percent_encode(beer, NON_ALPHANUMERIC)
        );
        let body = match self.fetch_html(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(brewery_url, error = %e, "brewery-scoped fetch failed");
                return None;
            }
        };
        match parse_search_hits(&body) {
            Ok(hits) => hits
                .into_iter()
                .next()
                .map(|hit| absolutize(&self.base_url, &hit.href)),
            Err(e) => {
                tracing::warn!(brewery_url, error = %e, "brewery-scoped parse failed");
                None
            }
        }
    }
}

/// Extracts beer links and brewery text from a results page, capped at the
/// top hits.
fn parse_search_hits(body: &str) -> Result<Vec<SearchHit>, UntappdError> {
    let item_sel = selector(".beer-item")?;
    let name_link_sel = selector(".name a")?;
    let brewery_sel = selector(".brewery")?;

    let document = Html::parse_document(body);
    let mut hits = Vec::new();
    for item in document.select(&item_sel).take(RESULTS_TO_CHECK) {
        let Some(link) = item.select(&name_link_sel).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains("/b/") {
            continue;
        }
        let brewery_text = item
            .select(&brewery_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        hits.push(SearchHit {
            href: href.to_string(),
            brewery_text,
        });
    }
    Ok(hits)
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
