//! Scrape orchestration: run every shop scraper, merge the sightings
//! against the known catalog, and upsert.
//!
//! Per-shop failures are logged and surface as an empty list for that shop
//! rather than aborting the run; the run only fails when every shop failed.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use hopdb_core::{parse_price_numeric, AppConfig, CancelFlag, RawProduct, Shop, StockStatus};
use hopdb_db::{KnownProduct, ProductUpsert};
use hopdb_scraper::{scrape_shop, PageFetcher, ScrapeOptions};

pub(crate) async fn run_scrape(
    pool: &PgPool,
    config: &AppConfig,
    cancel: &CancelFlag,
    limit: Option<usize>,
    new_only: bool,
    full_scrape: bool,
    reset_first_seen: bool,
) -> anyhow::Result<()> {
    let known_rows = hopdb_db::load_known_products(pool).await?;
    let known: HashMap<String, KnownProduct> = known_rows
        .into_iter()
        .map(|k| (k.product_url.clone(), k))
        .collect();
    tracing::info!(known = known.len(), new_only, full_scrape, "starting scrape run");

    let fetcher = PageFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )?;
    let known_urls: Option<HashSet<String>> =
        new_only.then(|| known.keys().cloned().collect());

    let scrapes = Shop::ALL.into_iter().map(|shop| {
        let opts = ScrapeOptions {
            limit,
            known_urls: known_urls.clone(),
            full_scrape,
            sold_out_threshold: config.sold_out_threshold,
            page_batch: config.scraper_page_batch,
            cancel: cancel.clone(),
        };
        let fetcher = &fetcher;
        async move {
            match scrape_shop(shop, fetcher, &opts).await {
                Ok(items) => {
                    tracing::info!(shop = %shop, items = items.len(), "scrape complete");
                    (items, true)
                }
                Err(e) => {
                    tracing::error!(shop = %shop, error = %e, "scraper failed, continuing with other shops");
                    (Vec::new(), false)
                }
            }
        }
    });
    let results: Vec<(Vec<RawProduct>, bool)> = futures::future::join_all(scrapes).await;

    let failed = results.iter().filter(|(_, ok)| !ok).count();
    if failed == Shop::ALL.len() {
        anyhow::bail!("all {failed} shop scrapers failed");
    }

    let per_shop: Vec<Vec<RawProduct>> = results.into_iter().map(|(items, _)| items).collect();
    let outcome = merge_sightings(&known, per_shop, Utc::now(), new_only, reset_first_seen);
    let written = hopdb_db::upsert_products(pool, &outcome.upserts).await?;

    println!(
        "scrape finished: {written} rows written ({} new, {} restocks)",
        outcome.new_items, outcome.restocks
    );
    Ok(())
}

#[derive(Debug, Default)]
struct MergeOutcome {
    upserts: Vec<ProductUpsert>,
    new_items: usize,
    restocks: usize,
}

/// Merges scraped sightings against the known catalog.
///
/// Each shop's list arrives in listing order (newest first) and is processed
/// reversed, oldest first, so new arrivals receive monotonically increasing
/// `first_seen` stamps of `base_time + i` microseconds, with `i` shared
/// across all shops. A known product keeps its `first_seen` unless this
/// sighting is a restock (or `reset_first_seen` is set); in `new_only` mode,
/// known non-restock products are not upserted at all.
fn merge_sightings(
    known: &HashMap<String, KnownProduct>,
    per_shop: Vec<Vec<RawProduct>>,
    base_time: DateTime<Utc>,
    new_only: bool,
    reset_first_seen: bool,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let mut index: i64 = 0;

    for shop_items in per_shop {
        for item in shop_items.into_iter().rev() {
            let item_time = base_time + Duration::microseconds(index);
            let price_numeric = item.price_text.as_deref().and_then(parse_price_numeric);

            let first_seen = match known.get(&item.product_url) {
                None => {
                    outcome.new_items += 1;
                    item_time
                }
                Some(prev) => {
                    let was_unavailable =
                        StockStatus::text_indicates_unavailable(&prev.stock_status);
                    let now_available =
                        !StockStatus::text_indicates_unavailable(item.stock_status.as_str());
                    if was_unavailable && now_available {
                        tracing::info!(
                            shop = %item.shop,
                            name = %item.name,
                            "restock detected, resetting first_seen"
                        );
                        outcome.restocks += 1;
                        item_time
                    } else if new_only {
                        continue;
                    } else if reset_first_seen {
                        item_time
                    } else {
                        prev.first_seen
                    }
                }
            };

            index += 1;
            outcome.upserts.push(ProductUpsert {
                product_url: item.product_url,
                name: item.name,
                price_text: item.price_text,
                price_numeric,
                image_url: item.image_url,
                stock_status: item.stock_status.as_str().to_string(),
                shop: item.shop.label().to_string(),
                first_seen,
                last_seen: item_time,
            });
        }
    }

    outcome
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
