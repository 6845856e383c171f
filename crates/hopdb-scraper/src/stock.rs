//! Per-shop stock classification and price extraction over product detail
//! pages, used by the stock refresher.
//!
//! Classifiers are deterministic and ordered: explicit sold-out evidence
//! first (a disabled button, a token in the native script, a banner image),
//! then add-to-cart presence, then an in-stock default so a template change
//! degrades to "available" rather than a false sold-out.

use encoding_rs::{EUC_JP_INIT, Encoding, SHIFT_JIS_INIT, UTF_8_INIT};
use hopdb_core::{Shop, StockStatus};
use scraper::Html;

use crate::error::ScraperError;
use crate::html::{element_text, selector};

/// Outcome of one detail-page check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCheck {
    pub stock_status: StockStatus,
    pub price_text: Option<String>,
}

/// Encoding preference list for a shop's detail pages.
pub fn detail_encodings(shop: Shop) -> &'static [&'static Encoding] {
    static EUC_FIRST: [&Encoding; 3] = [&EUC_JP_INIT, &SHIFT_JIS_INIT, &UTF_8_INIT];
    static UTF_FIRST: [&Encoding; 2] = [&UTF_8_INIT, &SHIFT_JIS_INIT];
    match shop {
        Shop::Chouseiya | Shop::IchigoIchie => &EUC_FIRST,
        Shop::BeerVolta | Shop::Arome => &UTF_FIRST,
    }
}

/// Classifies one fetched detail page for `shop`.
///
/// # Errors
///
/// Returns [`ScraperError::Selector`] if a classifier selector fails to
/// compile; parse results never error, they default.
pub fn classify_detail_page(shop: Shop, body: &str) -> Result<StockCheck, ScraperError> {
    let document = Html::parse_document(body);
    let stock_status = match shop {
        Shop::BeerVolta => classify_beervolta(&document)?,
        Shop::Chouseiya => classify_chouseiya(&document),
        Shop::IchigoIchie => classify_ichigo_ichie(&document)?,
        Shop::Arome => classify_arome(&document)?,
    };
    let price_text = extract_price(shop, &document)?;
    Ok(StockCheck {
        stock_status,
        price_text,
    })
}

fn classify_beervolta(document: &Html) -> Result<StockStatus, ScraperError> {
    let text = document.root_element().text().collect::<String>();
    if text.contains("SOLD OUT") || text.contains("売切") {
        return Ok(StockStatus::SoldOut);
    }
    if document.select(&selector(".soldout")?).next().is_some() {
        return Ok(StockStatus::SoldOut);
    }
    Ok(StockStatus::InStock)
}

fn classify_chouseiya(document: &Html) -> StockStatus {
    let text = document.root_element().text().collect::<String>();
    if text.contains("売り切れ") || text.contains("SOLD OUT") {
        StockStatus::SoldOut
    } else {
        StockStatus::InStock
    }
}

fn classify_ichigo_ichie(document: &Html) -> Result<StockStatus, ScraperError> {
    if document.select(&selector(".btn-soldout")?).next().is_some() {
        return Ok(StockStatus::SoldOut);
    }
    if document
        .select(&selector("button.btn-addcart, button.cart_in_async")?)
        .next()
        .is_some()
    {
        return Ok(StockStatus::InStock);
    }
    Ok(StockStatus::InStock)
}

fn classify_arome(document: &Html) -> Result<StockStatus, ScraperError> {
    if let Some(zone) = document.select(&selector("div.text-zone")?).next() {
        if element_text(zone).contains("在庫切れ") {
            return Ok(StockStatus::SoldOut);
        }
    }
    if document
        .select(&selector("img[alt='売り切れ'], img[src*='soldout']")?)
        .next()
        .is_some()
    {
        return Ok(StockStatus::SoldOut);
    }
    Ok(StockStatus::InStock)
}

fn extract_price(shop: Shop, document: &Html) -> Result<Option<String>, ScraperError> {
    let candidates: &[&str] = match shop {
        Shop::Arome | Shop::Chouseiya => &[".price", "#price"],
        Shop::BeerVolta => &[".price", ".product_price"],
        Shop::IchigoIchie => &[".product_price", ".price", ".product_data_price"],
    };
    for sel_text in candidates {
        let sel = selector(sel_text)?;
        if let Some(el) = document.select(&sel).next() {
            let text = element_text(el);
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ichigo_sold_out_button_wins_over_cart_button() {
        let body = r#"<button class="btn-soldout" disabled>SOLD OUT</button>
                      <button class="btn-addcart">カートに入れる</button>"#;
        let check = classify_detail_page(Shop::IchigoIchie, body).unwrap();
        assert_eq!(check.stock_status, StockStatus::SoldOut);
    }

    #[test]
    fn ichigo_cart_button_means_in_stock() {
        let body = r#"<button class="btn-addcart cart_in_async">カートに入れる</button>
                      <span class="product_price">770円</span>"#;
        let check = classify_detail_page(Shop::IchigoIchie, body).unwrap();
        assert_eq!(check.stock_status, StockStatus::InStock);
        assert_eq!(check.price_text.as_deref(), Some("770円"));
    }

    #[test]
    fn beervolta_text_token_marks_sold_out() {
        let body = "<html><body><p>この商品は売切です</p></body></html>";
        let check = classify_detail_page(Shop::BeerVolta, body).unwrap();
        assert_eq!(check.stock_status, StockStatus::SoldOut);
    }

    #[test]
    fn chouseiya_defaults_to_in_stock() {
        let body = r#"<html><body><p class="price">935円(税込)</p></body></html>"#;
        let check = classify_detail_page(Shop::Chouseiya, body).unwrap();
        assert_eq!(check.stock_status, StockStatus::InStock);
        assert_eq!(check.price_text.as_deref(), Some("935円(税込)"));
    }

    #[test]
    fn arome_sold_out_banner_image() {
        let body = r#"<html><body><img src="/img/soldout.gif"></body></html>"#;
        let check = classify_detail_page(Shop::Arome, body).unwrap();
        assert_eq!(check.stock_status, StockStatus::SoldOut);
    }

    #[test]
    fn arome_text_zone_sold_out() {
        let body = r#"<div class="text-zone">在庫切れ</div>"#;
        let check = classify_detail_page(Shop::Arome, body).unwrap();
        assert_eq!(check.stock_status, StockStatus::SoldOut);
    }

    #[test]
    fn missing_price_element_yields_none() {
        let check = classify_detail_page(Shop::BeerVolta, "<html><body></body></html>").unwrap();
        assert_eq!(check.stock_status, StockStatus::InStock);
        assert!(check.price_text.is_none());
    }
}
