//! Client for the external beer catalog: search cascade, beer detail
//! scraping, and brewery detail scraping.

mod beer;
mod brewery;
mod error;
mod html;
mod normalize;
mod search;
mod validate;

pub use beer::BeerDetail;
pub use brewery::BreweryDetail;
pub use error::UntappdError;
pub use normalize::{
    clean_beer_name, is_beer_page_url, is_search_placeholder, normalize_for_comparison,
};
pub use search::{BeerQuery, SearchOutcome, UntappdClient, DEFAULT_BASE_URL};
pub use validate::brewery_matches;
