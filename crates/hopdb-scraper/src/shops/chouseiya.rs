//! Chouseiya: EUC-JP MakeShop storefront with numbered list pages. A 404 on
//! a page URL marks the end of the catalog.

use encoding_rs::{EUC_JP, SHIFT_JIS, UTF_8};
use hopdb_core::{RawProduct, Shop, StockStatus};
use scraper::Html;

use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::html::{absolutize, element_text, selector};
use crate::paginate::{KnownUrlTracker, ScrapeOptions, SoldOutTracker};

const ORIGIN: &str = "https://beer-chouseiya.shop";
const MAX_PAGES: usize = 50;

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
    let mut sold_out = SoldOutTracker::new(opts);
    let mut known = KnownUrlTracker::new(opts);

    'pages: for page in 1..=MAX_PAGES {
        if opts.should_stop(products.len()) {
            break;
        }

        let url = format!("{origin}/shopbrand/all_items/page{page}/order/");
        tracing::debug!(shop = Shop::Chouseiya.slug(), page, url, "fetching list page");

        let body = match fetcher
            .fetch_page(&url, &[EUC_JP, SHIFT_JIS, UTF_8], false)
            .await
        {
            Ok(body) => body,
            Err(ScraperError::NotFound { .. }) => {
                tracing::debug!(shop = Shop::Chouseiya.slug(), page, "page not found, done");
                break;
            }
            Err(err) => return Err(err),
        };

        let items = parse_list_page(origin, &body)?;
        if items.is_empty() {
            tracing::debug!(shop = Shop::Chouseiya.slug(), page, "empty page, done");
            break;
        }

        for item in items {
            if opts.should_stop(products.len()) {
                break 'pages;
            }
            let status = item.stock_status;
            let is_known = opts.is_known(&item.product_url);
            products.push(item);
            if sold_out.observe(status) || known.observe(is_known) {
                tracing::info!(
                    shop = Shop::Chouseiya.slug(),
                    page,
                    "early stop tripped, ending pagination"
                );
                break 'pages;
            }
        }
    }

    Ok(products)
}

/// Parses one `div.innerBox` listing page. The quantity line carries the
/// availability signal: "売り切れ" or a zero count means sold out.
pub(crate) fn parse_list_page(origin: &str, body: &str) -> Result<Vec<RawProduct>, ScraperError> {
    let item_sel = selector("div.innerBox")?;
    let img_wrap_sel = selector("div.imgWrap")?;
    let a_sel = selector("a")?;
    let img_sel = selector("img")?;
    let name_sel = selector("div.detail p.name")?;
    let price_sel = selector("div.detail p.price")?;
    let quantity_sel = selector("div.detail p.quantity")?;

    let document = Html::parse_document(body);
    let mut products = Vec::new();

    for item in document.select(&item_sel) {
        let Some(img_wrap) = item.select(&img_wrap_sel).next() else {
            continue;
        };
        let Some(href) = img_wrap
            .select(&a_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let product_url = absolutize(origin, href);

        let image_url = img_wrap
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

        let stock_status = match item.select(&quantity_sel).next().map(element_text) {
            Some(qty) if qty.contains("売り切れ") || qty.contains("0個") => StockStatus::SoldOut,
            _ => StockStatus::InStock,
        };

        products.push(RawProduct {
            name,
            price_text,
            image_url,
            product_url,
            stock_status,
            shop: Shop::Chouseiya,
        });
    }

    Ok(products)
}

#[cfg(test)]
#[path = "chouseiya_test.rs"]
mod tests;
