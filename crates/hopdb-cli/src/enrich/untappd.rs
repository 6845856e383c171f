//! Stage 2: link extracted names to pages on the external beer catalog and
//! cache the scraped beer details.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use sqlx::PgPool;

use hopdb_core::{AppConfig, CancelFlag, EnrichmentRules, StockStatus};
use hopdb_db::{
    get_extraction, get_external_beer, select_products, set_extraction_ref, set_product_ref,
    upsert_external_beer, ExternalBeerRow, ProductFilter, ProductOrder, ProductViewRow,
};
use hopdb_untappd::{is_beer_page_url, BeerQuery, SearchOutcome, UntappdClient};

use super::ExtractedNames;

/// Crossing this many consecutive sold-out rows aborts a refresh batch; the
/// selection already excludes sold-out products, so a long streak means the
/// batch is stale. Disabled when a name filter narrows the run.
const SOLD_OUT_ABORT: u32 = 30;

/// Pause before hitting a detail page, and a shorter one between products.
const DETAIL_DELAY: Duration = Duration::from_secs(2);
const ITEM_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchMode {
    /// Find links for products that have none.
    Missing,
    /// Re-scrape details for stale linked products.
    Refresh,
}

/// Runs one matching batch. Returns the brewery URLs discovered along the
/// way so a chained run can feed them straight into the brewery stage.
pub(crate) async fn run_match(
    pool: &PgPool,
    config: &AppConfig,
    cancel: &CancelFlag,
    limit: usize,
    mode: MatchMode,
    shop: Option<&str>,
    name_filter: Option<&str>,
    carriers: Option<&ExtractedNames>,
) -> anyhow::Result<Vec<String>> {
    let shop = super::shop_label(shop)?;
    let name_ilike = super::keyword_pattern(name_filter);
    let client = UntappdClient::new(config.untappd_request_timeout_secs)?;
    let rules = EnrichmentRules::load(&config.rules_path)?;

    match mode {
        MatchMode::Missing => {
            run_missing(pool, &client, &rules, cancel, shop, name_ilike, limit, carriers).await
        }
        MatchMode::Refresh => run_refresh(pool, &client, cancel, shop, name_ilike, limit).await,
    }
}

async fn run_missing(
    pool: &PgPool,
    client: &UntappdClient,
    rules: &EnrichmentRules,
    cancel: &CancelFlag,
    shop: Option<String>,
    name_ilike: Option<String>,
    limit: usize,
    carriers: Option<&ExtractedNames>,
) -> anyhow::Result<Vec<String>> {
    let index = super::load_brewery_index(pool).await?;
    let filter = ProductFilter {
        shop,
        name_ilike,
        missing_external_ref: true,
        exclude_bundles: true,
        ..ProductFilter::default()
    };
    let rows = select_products(pool, &filter, ProductOrder::FirstSeenDesc, Some(limit as i64))
        .await?;
    tracing::info!(candidates = rows.len(), "starting catalog matching");

    let mut brewery_urls: Vec<String> = Vec::new();
    let mut matched = 0usize;
    let mut reused = 0usize;
    let mut placeholders = 0usize;
    let mut skipped = 0usize;

    for (i, row) in rows.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!("cancelled, stopping matching");
            break;
        }
        if i > 0 {
            tokio::time::sleep(ITEM_DELAY).await;
        }

        // A prior run may have already found this beer and stored the link
        // on the extraction; reuse it instead of searching again.
        let extraction = get_extraction(pool, &row.product_url).await?;
        if let Some(stored) = extraction
            .as_ref()
            .and_then(|e| e.external_beer_ref.as_deref())
        {
            if is_beer_page_url(stored) {
                tracing::info!(name = %row.name, url = stored, "reusing stored match");
                set_product_ref(pool, &row.product_url, stored).await?;
                match ensure_beer_detail(pool, client, stored).await {
                    Ok(Some(brewery_url)) => brewery_urls.push(brewery_url),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(url = stored, error = %e, "detail fetch failed");
                    }
                }
                reused += 1;
                continue;
            }
        }

        let Some(names) = resolve_names(row, carriers) else {
            tracing::debug!(name = %row.name, "no usable names, skipping");
            skipped += 1;
            continue;
        };

        let brewery = names.brewery_latin.as_deref();
        let hint = brewery.and_then(|b| index.lookup(b));
        let empty: Vec<String> = Vec::new();
        let query = BeerQuery {
            beer_latin: names.beer_latin.as_deref(),
            beer_native: names.beer_native.as_deref(),
            brewery,
            brewery_aliases: hint.map_or(&empty, |h| &h.aliases),
            brewery_page_hint: hint.and_then(|h| h.external_url.as_deref()),
        };

        match client.find_beer(rules, &query).await {
            SearchOutcome::Match(url) => {
                tracing::info!(name = %row.name, url = %url, "matched");
                set_extraction_ref(pool, &row.product_url, &url).await?;
                set_product_ref(pool, &row.product_url, &url).await?;
                match ensure_beer_detail(pool, client, &url).await {
                    Ok(Some(brewery_url)) => brewery_urls.push(brewery_url),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "detail fetch failed");
                    }
                }
                matched += 1;
            }
            SearchOutcome::Placeholder(url) => {
                // Recorded on the extraction only, so the product stays in
                // the missing pool and the query URL documents the miss.
                tracing::info!(name = %row.name, "no match, recording search placeholder");
                set_extraction_ref(pool, &row.product_url, &url).await?;
                placeholders += 1;
            }
        }
    }

    brewery_urls.sort();
    brewery_urls.dedup();
    println!(
        "matching finished: {matched} matched, {reused} reused, \
         {placeholders} placeholders, {skipped} skipped, {} breweries seen",
        brewery_urls.len()
    );
    Ok(brewery_urls)
}

async fn run_refresh(
    pool: &PgPool,
    client: &UntappdClient,
    cancel: &CancelFlag,
    shop: Option<String>,
    name_ilike: Option<String>,
    limit: usize,
) -> anyhow::Result<Vec<String>> {
    let filtered_by_name = name_ilike.is_some();
    let filter = ProductFilter {
        shop,
        name_ilike,
        with_external_ref: true,
        not_sold_out: true,
        stale_untappd_days: Some(5),
        ..ProductFilter::default()
    };
    let rows = select_products(
        pool,
        &filter,
        ProductOrder::FetchedAtAscNullsFirst,
        Some(limit as i64),
    )
    .await?;
    tracing::info!(candidates = rows.len(), "starting detail refresh");

    let mut brewery_urls: Vec<String> = Vec::new();
    let mut refreshed = 0usize;
    let mut skipped = 0usize;
    let mut failures = 0usize;
    let mut sold_out_streak = 0u32;

    for row in &rows {
        if cancel.is_cancelled() {
            tracing::warn!("cancelled, stopping refresh");
            break;
        }
        let Some(url) = row.external_beer_ref.as_deref() else {
            skipped += 1;
            continue;
        };
        if !is_beer_page_url(url) {
            skipped += 1;
            continue;
        }

        // The selection drops sold-out rows, so a streak here means the
        // batch went stale while we were walking it.
        if StockStatus::text_indicates_unavailable(&row.stock_status) {
            sold_out_streak += 1;
            if sold_out_streak >= SOLD_OUT_ABORT && !filtered_by_name {
                tracing::warn!(streak = sold_out_streak, "sold-out streak, aborting refresh");
                break;
            }
            skipped += 1;
            continue;
        }
        sold_out_streak = 0;

        tokio::time::sleep(DETAIL_DELAY).await;
        match fetch_and_store_detail(pool, client, url).await {
            Ok(brewery_url) => {
                if let Some(brewery_url) = brewery_url {
                    brewery_urls.push(brewery_url);
                }
                refreshed += 1;
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "detail refresh failed, skipping");
                failures += 1;
            }
        }
    }

    brewery_urls.sort();
    brewery_urls.dedup();
    println!("refresh finished: {refreshed} refreshed, {skipped} skipped, {failures} failed");
    Ok(brewery_urls)
}

/// The names driving one search, assembled from the in-memory carrier, the
/// stored extraction, or as a last resort the listing title itself.
struct ResolvedNames {
    beer_latin: Option<String>,
    beer_native: Option<String>,
    brewery_latin: Option<String>,
}

fn resolve_names(row: &ProductViewRow, carriers: Option<&ExtractedNames>) -> Option<ResolvedNames> {
    if let Some(extraction) = carriers.and_then(|c| c.get(&row.product_url)) {
        if extraction.is_bundle {
            return None;
        }
        return checked(ResolvedNames {
            beer_latin: extraction.beer_name_latin.clone(),
            beer_native: extraction.beer_name_native.clone(),
            brewery_latin: extraction
                .brewery_name_latin
                .clone()
                .or_else(|| extraction.brewery_name_native.clone()),
        });
    }

    if row.is_bundle == Some(true) {
        return None;
    }
    if row.beer_name_latin.is_some() || row.beer_name_native.is_some() {
        return checked(ResolvedNames {
            beer_latin: row.beer_name_latin.clone(),
            beer_native: row.beer_name_native.clone(),
            brewery_latin: row
                .brewery_name_latin
                .clone()
                .or_else(|| row.brewery_name_native.clone()),
        });
    }
    title_fallback(&row.name)
}

fn checked(names: ResolvedNames) -> Option<ResolvedNames> {
    (names.beer_latin.is_some() || names.beer_native.is_some()).then_some(names)
}

/// Several shops title their listings `【beer/brewery】...`; when extraction
/// produced nothing, that pattern is still worth a search.
fn title_fallback(title: &str) -> Option<ResolvedNames> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"【(.*?)/(.*?)】").expect("valid title fallback regex")
    });
    let captures = re.captures(title)?;
    let beer = captures.get(1)?.as_str().trim();
    let brewery = captures.get(2)?.as_str().trim();
    if beer.is_empty() {
        return None;
    }
    Some(ResolvedNames {
        beer_latin: Some(beer.to_string()),
        beer_native: None,
        brewery_latin: (!brewery.is_empty()).then(|| brewery.to_string()),
    })
}

/// Makes sure a matched beer has a cached detail row, fetching the page when
/// the cache has none. Returns the brewery URL when one is known.
async fn ensure_beer_detail(
    pool: &PgPool,
    client: &UntappdClient,
    url: &str,
) -> anyhow::Result<Option<String>> {
    if let Some(existing) = get_external_beer(pool, url).await? {
        if existing.fetched_at.is_some() {
            return Ok(existing.external_brewery_url);
        }
    }
    tokio::time::sleep(DETAIL_DELAY).await;
    fetch_and_store_detail(pool, client, url).await
}

async fn fetch_and_store_detail(
    pool: &PgPool,
    client: &UntappdClient,
    url: &str,
) -> anyhow::Result<Option<String>> {
    let detail = client.fetch_beer(url).await?;
    let brewery_url = detail.brewery_url.clone();
    upsert_external_beer(
        pool,
        &ExternalBeerRow {
            external_url: url.to_string(),
            beer_name: detail.beer_name,
            brewery_name: detail.brewery_name,
            style: detail.style,
            abv: detail.abv,
            ibu: detail.ibu,
            rating: detail.rating,
            rating_count: detail.rating_count,
            image_url: detail.image_url,
            external_brewery_url: detail.brewery_url,
            fetched_at: None,
        },
        true,
    )
    .await?;
    Ok(brewery_url)
}

#[cfg(test)]
#[path = "untappd_test.rs"]
mod tests;
