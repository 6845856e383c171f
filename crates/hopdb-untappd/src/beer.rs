//! Beer detail page parsing.

use scraper::Html;

use crate::error::UntappdError;
use crate::html::{absolutize, element_text, selector};
use crate::search::UntappdClient;

/// Fields scraped from one beer page. Everything is optional; the page
/// layout shifts and a partial row is still worth storing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeerDetail {
    pub beer_name: Option<String>,
    pub brewery_name: Option<String>,
    pub brewery_url: Option<String>,
    pub style: Option<String>,
    pub abv: Option<String>,
    pub ibu: Option<String>,
    pub rating: Option<String>,
    pub rating_count: Option<String>,
    pub image_url: Option<String>,
}

impl UntappdClient {
    /// Fetches and parses a beer detail page.
    ///
    /// # Errors
    ///
    /// Returns `UntappdError` on fetch failure or non-2xx status; a page
    /// that fetched but yields no fields parses to an all-`None` detail.
    pub async fn fetch_beer(&self, url: &str) -> Result<BeerDetail, UntappdError> {
        let body = self.fetch_html(url).await?;
        parse_beer_page(&body, self.base_url())
    }
}

pub(crate) fn parse_beer_page(body: &str, origin: &str) -> Result<BeerDetail, UntappdError> {
    let name_sel = selector(".name h1")?;
    let brewery_sel = selector(".name .brewery")?;
    let brewery_link_sel = selector("a")?;
    let style_sel = selector(".name .style")?;
    let label_sel = selector(".label img")?;
    let abv_sel = selector(".details .abv")?;
    let ibu_sel = selector(".details .ibu")?;
    let rating_sel = selector(".details .num")?;
    let raters_sel = selector(".details .raters")?;

    let document = Html::parse_document(body);
    let mut detail = BeerDetail::default();

    if let Some(el) = document.select(&name_sel).next() {
        detail.beer_name = Some(element_text(el));
    }

    if let Some(brewery) = document.select(&brewery_sel).next() {
        // Prefer the link text; the container can carry "Subsidiary of ..."
        // trailer text.
        if let Some(link) = brewery.select(&brewery_link_sel).next() {
            detail.brewery_name = Some(element_text(link));
            if let Some(href) = link.value().attr("href") {
                detail.brewery_url = Some(absolutize(origin, href));
            }
        } else {
            detail.brewery_name = Some(element_text(brewery));
        }
    }

    if let Some(el) = document.select(&style_sel).next() {
        detail.style = Some(element_text(el));
    }

    if let Some(img) = document.select(&label_sel).next() {
        if let Some(src) = img.value().attr("src") {
            detail.image_url = Some(src.to_string());
        }
    }

    if let Some(el) = document.select(&abv_sel).next() {
        detail.abv = Some(element_text(el).replace(" ABV", "").trim().to_string());
    }
    if let Some(el) = document.select(&ibu_sel).next() {
        detail.ibu = Some(element_text(el).replace(" IBU", "").trim().to_string());
    }
    if let Some(el) = document.select(&rating_sel).next() {
        detail.rating = Some(
            element_text(el)
                .trim_matches(|c| c == '(' || c == ')')
                .to_string(),
        );
    }
    if let Some(el) = document.select(&raters_sel).next() {
        let count = element_text(el)
            .replace(" Ratings", "")
            .replace(" Rating", "");
        detail.rating_count = Some(count.trim_matches(|c| c == '(' || c == ')').to_string());
    }

    Ok(detail)
}
