//! Ichigo Ichie (151l.shop): the deepest catalog of the four, several
//! hundred list pages. Pages are fetched in concurrent batches and consumed
//! strictly in page order; the first empty page ends the walk.

use encoding_rs::{EUC_JP, SHIFT_JIS, UTF_8};
use hopdb_core::{RawProduct, Shop, StockStatus};
use scraper::Html;

use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::html::{absolutize, element_text, selector};
use crate::paginate::{KnownUrlTracker, ScrapeOptions, SoldOutTracker};

const ORIGIN: &str = "https://151l.shop";
const GROUP_QUERY: &str = "?mode=grp&gid=1978037&sort=n";
const MAX_PAGES: usize = 800;

pub async fn scrape(
    fetcher: &PageFetcher,
    opts: &ScrapeOptions,
) -> Result<Vec<RawProduct>, ScraperError> {
    scrape_from(ORIGIN, fetcher, opts).await
}

pub(crate) async fn scrape_from(
    origin: &str,
    fetcher: &PageFetcher,
    opts: &ScrapeOptions,
) -> Result<Vec<RawProduct>, ScraperError> {
    let batch_size = opts.page_batch.max(1);
    let mut products = Vec::new();
    let mut sold_out = SoldOutTracker::new(opts);
    let mut known = KnownUrlTracker::new(opts);
    let mut next_page = 1usize;

    'batches: while next_page <= MAX_PAGES {
        if opts.should_stop(products.len()) {
            break;
        }

        let batch_end = (next_page + batch_size - 1).min(MAX_PAGES);
        let pages: Vec<usize> = (next_page..=batch_end).collect();
        tracing::debug!(
            shop = Shop::IchigoIchie.slug(),
            first = next_page,
            last = batch_end,
            "fetching page batch"
        );

        let fetches = pages.iter().map(|page| {
            let url = format!("{origin}/{GROUP_QUERY}&page={page}");
            async move {
                fetcher
                    .fetch_page(&url, &[EUC_JP, SHIFT_JIS, UTF_8], false)
                    .await
            }
        });
        let bodies = futures::future::join_all(fetches).await;

        // Batch results arrive in arbitrary completion order internally but
        // join_all preserves input order, so consumption stays page-ordered.
        for (page, body) in pages.iter().zip(bodies) {
            let body = match body {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(
                        shop = Shop::IchigoIchie.slug(),
                        page,
                        error = %err,
                        "page fetch failed, ending pagination"
                    );
                    break 'batches;
                }
            };

            let items = parse_list_page(origin, &body)?;
            if items.is_empty() {
                tracing::debug!(shop = Shop::IchigoIchie.slug(), page, "empty page, done");
                break 'batches;
            }

            for item in items {
                if opts.should_stop(products.len()) {
                    break 'batches;
                }
                let status = item.stock_status;
                let is_known = opts.is_known(&item.product_url);
                products.push(item);
                if sold_out.observe(status) || known.observe(is_known) {
                    tracing::info!(
                        shop = Shop::IchigoIchie.slug(),
                        page,
                        "early stop tripped, ending pagination"
                    );
                    break 'batches;
                }
            }
        }

        next_page = batch_end + 1;
    }

    Ok(products)
}

/// Parses one `li.productlist_list` listing page.
pub(crate) fn parse_list_page(origin: &str, body: &str) -> Result<Vec<RawProduct>, ScraperError> {
    let item_sel = selector("li.productlist_list")?;
    let a_sel = selector("a")?;
    let img_sel = selector("img.item_img")?;
    let name_sel = selector("span.item_name")?;
    let price_sel = selector("span.item_price")?;

    let document = Html::parse_document(body);
    let mut products = Vec::new();

    for item in document.select(&item_sel) {
        let Some(href) = item
            .select(&a_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let product_url = absolutize(origin, href);

        let image_url = item
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| absolutize(origin, src));

        let name = item
            .select(&name_sel)
            .next()
            .map(element_text)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".to_owned());
        let price_text = item.select(&price_sel).next().map(element_text);

        let stock_status = if element_text(item).to_uppercase().contains("SOLD OUT") {
            StockStatus::SoldOut
        } else {
            StockStatus::InStock
        };

        products.push(RawProduct {
            name,
            price_text,
            image_url,
            product_url,
            stock_status,
            shop: Shop::IchigoIchie,
        });
    }

    Ok(products)
}

#[cfg(test)]
#[path = "ichigo_ichie_test.rs"]
mod tests;
