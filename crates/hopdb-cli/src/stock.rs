//! Stock refresher: re-check availability and price on product detail pages.
//!
//! Items run in chunks of `refresh_batch_size` with a short pause between
//! chunks; inside a chunk, a semaphore caps concurrent fetches at
//! `refresh_concurrency`. A fetch or classification failure skips the item
//! without touching the row, so a flaky page never overwrites good data.

use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::Semaphore;

use hopdb_core::{parse_price_numeric, AppConfig, CancelFlag, Shop};
use hopdb_db::{select_products, update_product_stock, ProductFilter, ProductOrder, ProductViewRow};
use hopdb_scraper::{classify_detail_page, detail_encodings, PageFetcher};

const CHUNK_DELAY: Duration = Duration::from_millis(500);

pub(crate) async fn run_update_stock(
    pool: &PgPool,
    config: &AppConfig,
    cancel: &CancelFlag,
    limit: Option<i64>,
    shop: Option<&str>,
    sort_rating: bool,
) -> anyhow::Result<()> {
    let filter = ProductFilter {
        shop: crate::enrich::shop_label(shop)?,
        ..ProductFilter::default()
    };
    let order = if sort_rating {
        ProductOrder::RatingDesc
    } else {
        ProductOrder::FirstSeenDesc
    };
    let rows = select_products(pool, &filter, order, limit).await?;
    tracing::info!(candidates = rows.len(), "starting stock refresh");

    let fetcher = PageFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )?;
    let semaphore = Semaphore::new(config.refresh_concurrency);

    let mut checked = 0usize;
    let mut changes = 0usize;
    let mut failures = 0usize;

    let chunks: Vec<&[ProductViewRow]> = rows.chunks(config.refresh_batch_size).collect();
    let total_chunks = chunks.len();
    for (i, chunk) in chunks.into_iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!("cancelled, stopping stock refresh");
            break;
        }
        let checks = chunk
            .iter()
            .map(|row| check_one(pool, &fetcher, &semaphore, row));
        for (row, result) in chunk.iter().zip(futures::future::join_all(checks).await) {
            match result {
                Ok(true) => {
                    checked += 1;
                    changes += 1;
                }
                Ok(false) => checked += 1,
                Err(e) => {
                    tracing::warn!(url = %row.product_url, error = %e, "stock check failed, skipping");
                    failures += 1;
                }
            }
        }
        tracing::info!(checked, failures, total = rows.len(), "stock refresh progress");
        if i + 1 < total_chunks {
            tokio::time::sleep(CHUNK_DELAY).await;
        }
    }

    println!("stock refresh finished: {checked} checked, {changes} status changes, {failures} failed");
    Ok(())
}

/// Re-checks one product. Returns whether the stock status changed.
///
/// `last_seen` always advances on success; the status column is written only
/// when the classification differs from the stored value, so an unchanged
/// page leaves no trace beyond the timestamp.
async fn check_one(
    pool: &PgPool,
    fetcher: &PageFetcher,
    semaphore: &Semaphore,
    row: &ProductViewRow,
) -> anyhow::Result<bool> {
    let shop = Shop::parse(&row.shop)
        .ok_or_else(|| anyhow::anyhow!("unknown shop label {:?}", row.shop))?;

    let body = {
        let _permit = semaphore.acquire().await?;
        fetcher
            .fetch_page(&row.product_url, detail_encodings(shop), shop == Shop::Arome)
            .await?
    };
    let check = classify_detail_page(shop, &body)?;

    let status_changed = check.stock_status.as_str() != row.stock_status;
    if status_changed {
        tracing::info!(
            name = %row.name,
            from = %row.stock_status,
            to = %check.stock_status,
            "stock status changed"
        );
    }
    let price_numeric = check.price_text.as_deref().and_then(parse_price_numeric);
    update_product_stock(
        pool,
        &row.product_url,
        status_changed.then(|| check.stock_status.as_str()),
        check.price_text.as_deref(),
        price_numeric,
    )
    .await?;
    Ok(status_changed)
}
