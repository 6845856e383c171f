//! Domain types shared across the scraper, store, and enrichment crates.

use serde::{Deserialize, Serialize};

/// The retailers the pipeline knows how to scrape.
///
/// The display name is the exact string persisted in the `shop` column and
/// shown on the source site, so round-tripping through the store is lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shop {
    BeerVolta,
    Chouseiya,
    IchigoIchie,
    Arome,
}

impl Shop {
    /// All configured shops, in orchestration order.
    pub const ALL: [Shop; 4] = [
        Shop::BeerVolta,
        Shop::Chouseiya,
        Shop::IchigoIchie,
        Shop::Arome,
    ];

    /// The persisted shop label (matches what the source site calls itself).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Shop::BeerVolta => "BEER VOLTA",
            Shop::Chouseiya => "ちょうせいや",
            Shop::IchigoIchie => "一期一会～る",
            Shop::Arome => "アローム",
        }
    }

    /// ASCII identifier used on the command line (`--shop`).
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Shop::BeerVolta => "beervolta",
            Shop::Chouseiya => "chouseiya",
            Shop::IchigoIchie => "ichigo-ichie",
            Shop::Arome => "arome",
        }
    }

    /// Resolves a shop from either its slug or its persisted label.
    #[must_use]
    pub fn parse(s: &str) -> Option<Shop> {
        Shop::ALL
            .into_iter()
            .find(|shop| shop.slug() == s || shop.label() == s)
    }
}

impl std::fmt::Display for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Availability of a product as classified from its page or listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StockStatus {
    InStock,
    SoldOut,
    Preorder,
    #[default]
    Unknown,
}

impl StockStatus {
    /// The persisted text form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::SoldOut => "Sold Out",
            StockStatus::Preorder => "Pre-order",
            StockStatus::Unknown => "Unknown",
        }
    }

    /// Parses a persisted status string. Historical rows may carry variant
    /// spellings ("Pre-order/Upcoming"), so matching is lenient.
    #[must_use]
    pub fn parse(s: &str) -> StockStatus {
        let lower = s.to_lowercase();
        if lower.contains("sold") || lower.contains("out") {
            StockStatus::SoldOut
        } else if lower.contains("pre-order") || lower.contains("preorder") {
            StockStatus::Preorder
        } else if lower.contains("in stock") {
            StockStatus::InStock
        } else {
            StockStatus::Unknown
        }
    }

    /// True when the status text indicates the product cannot be bought.
    /// This is the substring rule the restock detector applies to the raw
    /// stored text, so it accepts historical variants too.
    #[must_use]
    pub fn text_indicates_unavailable(s: &str) -> bool {
        let lower = s.to_lowercase();
        lower.contains("sold") || lower.contains("out")
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A product as emitted by a shop scraper, in listing order, before any
/// store-side merging. `product_url` is the system-wide identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProduct {
    pub name: String,
    pub price_text: Option<String>,
    pub image_url: Option<String>,
    pub product_url: String,
    pub stock_status: StockStatus,
    pub shop: Shop,
}

/// Extracts the numeric yen value from a scraped price string.
///
/// Strips every non-digit character; returns `None` when nothing remains.
#[must_use]
pub fn parse_price_numeric(price_text: &str) -> Option<i32> {
    let digits: String = price_text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i32>().ok()
}
