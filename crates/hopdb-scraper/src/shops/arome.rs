//! Arôme: an EC-CUBE storefront whose server only negotiates legacy cipher
//! suites, so every request goes through the dedicated legacy-TLS client.
//! List pages truncate long product names; those are completed from the
//! detail page when the product is not already known.

use std::sync::OnceLock;
use std::time::Duration;

use encoding_rs::{SHIFT_JIS, UTF_8};
use hopdb_core::{RawProduct, Shop, StockStatus};
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::html::{absolutize, element_text, selector};
use crate::paginate::{KnownUrlTracker, ScrapeOptions, SoldOutTracker};

const ORIGIN: &str = "https://www.arome.jp";
const PAGE_SIZE: u32 = 100;
const DETAIL_FETCH_CONCURRENCY: usize = 10;

fn product_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"product_id=(\d+)").expect("valid product_id regex"))
}

fn tax_included_price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"税込[:：]\s*[¥￥]\s*([0-9,]+)").expect("valid tax price regex")
    })
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9,]+)").expect("valid digits regex"))
}

fn yen_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9,]+)円").expect("valid yen suffix regex"))
}

fn yen_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[¥￥]\s*([0-9,]+)").expect("valid yen prefix regex"))
}

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
    let mut page = 1u32;

    loop {
        if opts.should_stop(products.len()) {
            break;
        }

        let url =
            format!("{origin}/products/list.php?category_id=0&disp_number={PAGE_SIZE}&pageno={page}");
        tracing::debug!(shop = Shop::Arome.slug(), page, url, "fetching list page");

        let body = fetcher.fetch_page(&url, &[UTF_8, SHIFT_JIS], true).await?;
        let (mut page_products, has_next) = parse_list_page(origin, page, &body)?;
        if page_products.is_empty() {
            tracing::debug!(shop = Shop::Arome.slug(), page, "empty page, done");
            break;
        }

        complete_truncated_names(fetcher, opts, &mut page_products).await;

        let mut stop = false;
        for item in page_products {
            if opts.should_stop(products.len()) {
                stop = true;
                break;
            }
            let status = item.stock_status;
            let is_known = opts.is_known(&item.product_url);
            products.push(item);
            if sold_out.observe(status) || known.observe(is_known) {
                tracing::info!(
                    shop = Shop::Arome.slug(),
                    page,
                    "early stop tripped, ending pagination"
                );
                stop = true;
                break;
            }
        }
        if stop || !has_next {
            break;
        }

        page += 1;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    Ok(products)
}

/// Fetches detail pages for items whose listing name was truncated, up to
/// [`DETAIL_FETCH_CONCURRENCY`] at a time. Known URLs keep their truncated
/// name; the stored row already has the full one.
async fn complete_truncated_names(
    fetcher: &PageFetcher,
    opts: &ScrapeOptions,
    page_products: &mut [RawProduct],
) {
    let truncated: Vec<usize> = page_products
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            (p.name.ends_with("...") || p.name.ends_with('…')) && !opts.is_known(&p.product_url)
        })
        .map(|(i, _)| i)
        .collect();
    if truncated.is_empty() {
        return;
    }
    tracing::debug!(
        shop = Shop::Arome.slug(),
        count = truncated.len(),
        "completing truncated names from detail pages"
    );

    for chunk in truncated.chunks(DETAIL_FETCH_CONCURRENCY) {
        let fetches = chunk.iter().map(|&i| {
            let url = page_products[i].product_url.clone();
            async move { (i, fetch_full_name(fetcher, &url).await) }
        });
        for (i, full_name) in futures::future::join_all(fetches).await {
            if let Some(full_name) = full_name {
                page_products[i].name = full_name;
            }
        }
    }
}

async fn fetch_full_name(fetcher: &PageFetcher, url: &str) -> Option<String> {
    let body = match fetcher.fetch_page(url, &[UTF_8, SHIFT_JIS], true).await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(shop = Shop::Arome.slug(), url, error = %err, "detail fetch failed");
            return None;
        }
    };
    parse_detail_title(&body)
}

/// Pulls the full product title from a detail page.
pub(crate) fn parse_detail_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    for sel_text in ["h2.productTitle", "h2.title"] {
        let Ok(sel) = selector(sel_text) else {
            continue;
        };
        if let Some(el) = document.select(&sel).next() {
            let title = element_text(el);
            if !title.is_empty() {
                return Some(title);
            }
        }
    }
    None
}

/// Canonicalizes a detail URL down to its `product_id`, so the same product
/// reached via different list contexts maps to one catalog row.
pub(crate) fn normalize_url(origin: &str, url: &str) -> String {
    match product_id_re().captures(url) {
        Some(caps) => format!("{origin}/products/detail.php?product_id={}", &caps[1]),
        None => url.to_owned(),
    }
}

/// Parses one `div.list_area` listing page. Returns the products plus
/// whether a next-page link exists.
pub(crate) fn parse_list_page(
    origin: &str,
    page: u32,
    body: &str,
) -> Result<(Vec<RawProduct>, bool), ScraperError> {
    let area_sel = selector("div.list_area")?;
    let photo_sel = selector("div.listphoto a")?;
    let img_sel = selector("img")?;
    let right_sel = selector("div.listrightbloc")?;
    let price_sel = selector("span.price")?;
    let text_zone_sel = selector("div.text-zone")?;
    let sold_img_sel = selector("img[alt='売り切れ'], img[src*='soldout']")?;
    let a_sel = selector("a")?;

    let document = Html::parse_document(body);
    let mut products = Vec::new();

    for area in document.select(&area_sel) {
        let Some(link) = area.select(&photo_sel).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let product_url = normalize_url(origin, &absolutize(origin, href));

        let img = link.select(&img_sel).next();
        let image_url = img
            .and_then(|i| i.value().attr("src"))
            .map(|src| absolutize(origin, src));

        let mut name = String::new();
        let mut price_text = None;
        if let Some(right) = area.select(&right_sel).next() {
            name = right
                .select(&a_sel)
                .find(|a| a.value().attr("href") == Some(href))
                .or_else(|| right.select(&a_sel).next())
                .map(anchor_leading_text)
                .unwrap_or_default();
            price_text = extract_price(right, &price_sel);
        }
        if name.is_empty() {
            name = img
                .and_then(|i| i.value().attr("alt"))
                .unwrap_or("Unknown")
                .to_owned();
        }

        let mut stock_status = StockStatus::InStock;
        if let Some(zone) = area.select(&text_zone_sel).next() {
            if element_text(zone).contains("在庫切れ") {
                stock_status = StockStatus::SoldOut;
            }
        }
        if stock_status == StockStatus::InStock && area.select(&sold_img_sel).next().is_some() {
            stock_status = StockStatus::SoldOut;
        }

        products.push(RawProduct {
            name,
            price_text,
            image_url,
            product_url,
            stock_status,
            shop: Shop::Arome,
        });
    }

    let has_next = document
        .select(&a_sel)
        .any(|a| element_text(a).contains("次へ"))
        || {
            let next_sel = selector(&format!("a[href*='pageno={}']", page + 1))?;
            document.select(&next_sel).next().is_some()
        };

    Ok((products, has_next))
}

/// Text of an anchor up to its first `<br>` or `<span>`: the list template
/// appends volume and style lines after a break inside the same anchor.
fn anchor_leading_text(anchor: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for child in anchor.children() {
        if let Some(el) = scraper::ElementRef::wrap(child) {
            let tag = el.value().name();
            if tag == "br" || tag == "span" {
                break;
            }
        } else if let Some(text) = child.value().as_text() {
            let t = text.trim();
            if !t.is_empty() {
                parts.push(t.to_owned());
            }
        }
    }
    parts.join(" ").trim().to_owned()
}

/// Price extraction ladder: the tax-included figure in `span.price`, any
/// digits there, then yen-marked digits anywhere in the right-hand block.
fn extract_price(right: ElementRef<'_>, price_sel: &scraper::Selector) -> Option<String> {
    if let Some(price_el) = right.select(price_sel).next() {
        let raw = element_text(price_el);
        if let Some(caps) = tax_included_price_re().captures(&raw) {
            return Some(format!("{}円", caps[1].replace(',', "")));
        }
        if let Some(caps) = digits_re().captures(&raw) {
            return Some(format!("{}円", caps[1].replace(',', "")));
        }
    }
    let text = element_text(right);
    yen_suffix_re()
        .captures(&text)
        .or_else(|| yen_prefix_re().captures(&text))
        .map(|caps| format!("{}円", caps[1].replace(',', "")))
}

#[cfg(test)]
#[path = "arome_test.rs"]
mod tests;
