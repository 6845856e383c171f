//! One scraper per retailer, behind a single dispatch point.
//!
//! Each shop module exposes an async `scrape` driving pagination plus
//! synchronous parse functions over the fetched HTML; the parse functions
//! are what the tests exercise directly.

use hopdb_core::{RawProduct, Shop};

use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::paginate::ScrapeOptions;

pub mod arome;
pub mod beervolta;
pub mod chouseiya;
pub mod ichigo_ichie;

/// Runs the scraper for `shop`. Output is in listing order as seen on the
/// site (typically newest first).
///
/// # Errors
///
/// Propagates the shop scraper's error; mid-pagination failures surface as
/// whatever the failing fetch produced, with items from earlier pages lost.
/// The orchestrator isolates these per shop.
pub async fn scrape_shop(
    shop: Shop,
    fetcher: &PageFetcher,
    opts: &ScrapeOptions,
) -> Result<Vec<RawProduct>, ScraperError> {
    match shop {
        Shop::BeerVolta => beervolta::scrape(fetcher, opts).await,
        Shop::Chouseiya => chouseiya::scrape(fetcher, opts).await,
        Shop::IchigoIchie => ichigo_ichie::scrape(fetcher, opts).await,
        Shop::Arome => arome::scrape(fetcher, opts).await,
    }
}
