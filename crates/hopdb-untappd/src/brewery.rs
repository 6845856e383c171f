//! Brewery detail page parsing.

use scraper::{ElementRef, Html};
use serde_json::{Map, Value};

use crate::error::UntappdError;
use crate::html::{element_text, selector};
use crate::search::UntappdClient;

/// Fields scraped from one brewery page. `stats` carries the check-in
/// counters as a loose JSON object because the set of counters shifts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreweryDetail {
    pub name: Option<String>,
    pub location: Option<String>,
    pub brewery_type: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub stats: Option<Value>,
}

impl UntappdClient {
    /// Fetches and parses a brewery detail page.
    ///
    /// # Errors
    ///
    /// Returns `UntappdError` on fetch failure or non-2xx status.
    pub async fn fetch_brewery(&self, url: &str) -> Result<BreweryDetail, UntappdError> {
        let body = self.fetch_html(url).await?;
        parse_brewery_page(&body)
    }
}

pub(crate) fn parse_brewery_page(body: &str) -> Result<BreweryDetail, UntappdError> {
    let h1_sel = selector("h1")?;
    let p_sel = selector("p")?;
    let label_img_sel = selector(".label img")?;
    let basic_img_sel = selector(".basic img")?;
    let logo_img_sel = selector(".logo img")?;
    let social_sel = selector(".social a")?;
    let stats_sel = selector(".stats")?;
    let stat_item_sel = selector(".item")?;
    let stat_title_sel = selector(".title")?;
    let stat_count_sel = selector(".count")?;

    let document = Html::parse_document(body);
    let mut detail = BreweryDetail::default();

    if let Some(h1) = document.select(&h1_sel).next() {
        detail.name = Some(element_text(h1));

        // Location and type sit in sibling <p> tags under the same header
        // block, location first. Subsidiary notes are skipped.
        if let Some(parent) = h1.parent().and_then(ElementRef::wrap) {
            for p in parent.select(&p_sel) {
                let text = element_text(p);
                if text.contains("Subsidiary of") {
                    continue;
                }
                if detail.location.is_none() && text.chars().any(char::is_alphabetic) {
                    detail.location = Some(text);
                } else if detail.brewery_type.is_none()
                    && detail.location.is_some()
                    && detail.location.as_deref() != Some(text.as_str())
                {
                    detail.brewery_type = Some(text);
                }
            }
        }
    }

    // The site header carries its own .logo img, so the label and basic
    // blocks are checked first.
    let logo = document
        .select(&label_img_sel)
        .next()
        .or_else(|| document.select(&basic_img_sel).next())
        .or_else(|| document.select(&logo_img_sel).next());
    if let Some(img) = logo {
        if let Some(src) = img.value().attr("src") {
            detail.logo_url = Some(src.to_string());
        }
    }

    for link in document.select(&social_sel) {
        let text = element_text(link).to_lowercase();
        if text.contains("website") {
            if let Some(href) = link.value().attr("href") {
                detail.website = Some(href.to_string());
            }
        }
    }

    if let Some(stats_block) = document.select(&stats_sel).next() {
        let mut stats = Map::new();
        for item in stats_block.select(&stat_item_sel) {
            let Some(title) = item.select(&stat_title_sel).next() else {
                continue;
            };
            let Some(count) = item.select(&stat_count_sel).next() else {
                continue;
            };
            let label = element_text(title).to_lowercase();
            let value = element_text(count).replace(',', "");
            let key = if label.contains("total") {
                "total_beers"
            } else if label.contains("unique") {
                "unique_users"
            } else if label.contains("monthly") {
                "monthly_checkins"
            } else if label.contains("ratings") {
                "rating_count"
            } else {
                continue;
            };
            stats.insert(key.to_string(), Value::String(value));
        }
        detail.stats = Some(Value::Object(stats));
    }

    Ok(detail)
}
