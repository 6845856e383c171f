//! Retail shop scrapers: list-page pagination with early stops, per-shop
//! HTML parsing, legacy-encoding decode, and the detail-page stock
//! classifiers used by the refresher.

pub mod error;
pub mod fetch;
mod html;
pub mod paginate;
mod retry;
pub mod shops;
pub mod stock;

pub use error::ScraperError;
pub use fetch::{decode_body, PageFetcher};
pub use paginate::{ScrapeOptions, KNOWN_URL_STOP};
pub use shops::scrape_shop;
pub use stock::{classify_detail_page, detail_encodings, StockCheck};
