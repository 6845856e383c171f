//! BEER VOLTA: two category listings (beer, mead/cider) with `page` query
//! pagination. UTF-8 site; products are anchors with a `?pid=` href.

use encoding_rs::UTF_8;
use hopdb_core::{RawProduct, Shop, StockStatus};
use scraper::Html;

use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::html::{absolutize, selector, text_parts};
use crate::paginate::{KnownUrlTracker, ScrapeOptions, SoldOutTracker};

const ORIGIN: &str = "https://beervolta.com";
const CATEGORY_QUERIES: [&str; 2] = [
    "?mode=cate&cbid=2270431&csid=0&sort=n",
    "?mode=cate&cbid=2830081&csid=0&sort=n",
];
const MAX_PAGES: usize = 100;

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
    let mut products = Vec::new();
    // The streak counters span category boundaries on purpose: the second
    // category continues where the first left off, as one listing feed.
    let mut sold_out = SoldOutTracker::new(opts);
    let mut known = KnownUrlTracker::new(opts);
    let mut stopped = false;

    'categories: for query in CATEGORY_QUERIES {
        for page in 1..=MAX_PAGES {
            if stopped || opts.should_stop(products.len()) {
                break 'categories;
            }

            let url = if page == 1 {
                format!("{origin}/{query}")
            } else {
                format!("{origin}/{query}&page={page}")
            };
            tracing::debug!(shop = Shop::BeerVolta.slug(), page, url, "fetching list page");

            let body = fetcher.fetch_page(&url, &[UTF_8], false).await?;
            let items = parse_list_page(origin, &body)?;
            if items.is_empty() {
                tracing::debug!(shop = Shop::BeerVolta.slug(), page, "empty page, next category");
                break;
            }

            for item in items {
                if opts.should_stop(products.len()) {
                    break 'categories;
                }
                let status = item.stock_status;
                let is_known = opts.is_known(&item.product_url);
                products.push(item);
                if sold_out.observe(status) || known.observe(is_known) {
                    tracing::info!(
                        shop = Shop::BeerVolta.slug(),
                        page,
                        "early stop tripped, ending pagination"
                    );
                    stopped = true;
                    break;
                }
            }
        }
    }

    Ok(products)
}

/// Parses one category listing page. Anchors without an image are
/// navigation links, not products, and are skipped; duplicate hrefs on one
/// page (image link plus title link) collapse to the first occurrence.
pub(crate) fn parse_list_page(origin: &str, body: &str) -> Result<Vec<RawProduct>, ScraperError> {
    let item_sel = selector("a[href*='?pid=']")?;
    let img_sel = selector("img")?;

    let document = Html::parse_document(body);
    let mut seen = std::collections::HashSet::new();
    let mut products = Vec::new();

    for anchor in document.select(&item_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let product_url = absolutize(origin, href);
        if !seen.insert(product_url.clone()) {
            continue;
        }

        let Some(image_url) = anchor
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_owned)
        else {
            continue;
        };

        let parts = text_parts(anchor);
        let price_text = parts.iter().find(|p| p.contains('円')).cloned();
        let name = parts
            .iter()
            .find(|p| !p.contains('円') && p.chars().count() > 2)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_owned());

        let joined = parts.join("|");
        let stock_status = if joined.contains("売切") || joined.to_uppercase().contains("SOLD OUT")
        {
            StockStatus::SoldOut
        } else if joined.contains("入荷予定") {
            StockStatus::Preorder
        } else {
            StockStatus::InStock
        };

        products.push(RawProduct {
            name,
            price_text,
            image_url: Some(image_url),
            product_url,
            stock_status,
            shop: Shop::BeerVolta,
        });
    }

    Ok(products)
}

#[cfg(test)]
#[path = "beervolta_test.rs"]
mod tests;
