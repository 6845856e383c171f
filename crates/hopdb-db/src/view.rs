//! Read queries over `product_view`, the joined projection of products,
//! extractions, cached beer details, and breweries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductViewRow {
    pub product_url: String,
    pub name: String,
    pub price_text: Option<String>,
    pub price_numeric: Option<i32>,
    pub image_url: Option<String>,
    pub stock_status: String,
    pub shop: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub external_beer_ref: Option<String>,
    pub brewery_name_native: Option<String>,
    pub brewery_name_latin: Option<String>,
    pub beer_name_native: Option<String>,
    pub beer_name_latin: Option<String>,
    pub is_bundle: Option<bool>,
    pub extraction_beer_ref: Option<String>,
    pub untappd_beer_name: Option<String>,
    pub untappd_brewery_name: Option<String>,
    pub untappd_style: Option<String>,
    pub untappd_abv: Option<String>,
    pub untappd_ibu: Option<String>,
    pub untappd_rating: Option<String>,
    pub untappd_rating_count: Option<String>,
    pub untappd_image_url: Option<String>,
    pub external_brewery_url: Option<String>,
    pub untappd_fetched_at: Option<DateTime<Utc>>,
    pub brewery_name: Option<String>,
    pub brewery_location: Option<String>,
    pub brewery_type: Option<String>,
}

/// Declarative filter over `product_view`. Every field is optional; unset
/// fields impose no constraint. The enrichment stages compose these instead
/// of writing ad-hoc SQL.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Exact shop label.
    pub shop: Option<String>,
    /// `ILIKE` pattern over the listing name; the caller supplies wildcards.
    pub name_ilike: Option<String>,
    /// Exact match on the product's external beer ref.
    pub external_beer_ref_eq: Option<String>,
    /// Keep rows whose cached beer detail is absent or older than this many
    /// days.
    pub stale_untappd_days: Option<i64>,
    /// Products whose names still need work: no Latin brewery name yet (the
    /// extraction row may be missing entirely) or no external beer link.
    /// Covers rows matched from native names alone whose Latin fields were
    /// never backfilled.
    pub missing_latin_or_external_ref: bool,
    /// Only products whose extraction exists but has no matched beer yet.
    pub has_extraction_missing_ref: bool,
    /// Only products already linked to an external beer.
    pub with_external_ref: bool,
    /// Only products with no external beer link yet.
    pub missing_external_ref: bool,
    /// Drop rows currently marked sold out.
    pub not_sold_out: bool,
    /// Drop multi-beer bundle listings.
    pub exclude_bundles: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOrder {
    /// Newest arrivals first.
    FirstSeenDesc,
    /// Least-recently-enriched first, never-enriched before everything.
    FetchedAtAscNullsFirst,
    /// Highest rating first. Ratings are stored as scraped text, so only
    /// values that parse as a number participate; the rest sort last.
    RatingDesc,
}

impl ProductOrder {
    fn sql(self) -> &'static str {
        match self {
            Self::FirstSeenDesc => "first_seen DESC, product_url",
            Self::FetchedAtAscNullsFirst => "untappd_fetched_at ASC NULLS FIRST, product_url",
            Self::RatingDesc => {
                "CASE WHEN untappd_rating ~ '^[0-9]+(\\.[0-9]+)?$' \
                      THEN untappd_rating::NUMERIC END DESC NULLS LAST, product_url"
            }
        }
    }
}

const VIEW_COLUMNS: &str = "product_url, name, price_text, price_numeric, image_url, \
     stock_status, shop, first_seen, last_seen, external_beer_ref, \
     brewery_name_native, brewery_name_latin, beer_name_native, beer_name_latin, \
     is_bundle, extraction_beer_ref, untappd_beer_name, untappd_brewery_name, \
     untappd_style, untappd_abv, untappd_ibu, untappd_rating, untappd_rating_count, \
     untappd_image_url, external_brewery_url, untappd_fetched_at, \
     brewery_name, brewery_location, brewery_type";

/// Builds the WHERE clause. The four value filters are always bound in the
/// same positions with a null guard, so one prepared statement covers every
/// combination; the boolean flags append static fragments.
fn where_clause(filter: &ProductFilter) -> String {
    let mut clause = String::from(
        "WHERE ($1::TEXT IS NULL OR shop = $1) \
           AND ($2::TEXT IS NULL OR name ILIKE $2) \
           AND ($3::TEXT IS NULL OR external_beer_ref = $3) \
           AND ($4::BIGINT IS NULL \
                OR untappd_fetched_at IS NULL \
                OR untappd_fetched_at < NOW() - ($4 * INTERVAL '1 day'))",
    );
    if filter.missing_latin_or_external_ref {
        clause.push_str(" AND (brewery_name_latin IS NULL OR external_beer_ref IS NULL)");
    }
    if filter.has_extraction_missing_ref {
        clause.push_str(" AND is_bundle IS NOT NULL AND extraction_beer_ref IS NULL");
    }
    if filter.with_external_ref {
        clause.push_str(" AND external_beer_ref IS NOT NULL");
    }
    if filter.missing_external_ref {
        clause.push_str(" AND external_beer_ref IS NULL");
    }
    if filter.not_sold_out {
        clause.push_str(" AND stock_status <> 'Sold Out'");
    }
    if filter.exclude_bundles {
        clause.push_str(" AND COALESCE(is_bundle, FALSE) = FALSE");
    }
    clause
}

/// Selects matching rows in the given order, optionally capped at `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_products(
    pool: &PgPool,
    filter: &ProductFilter,
    order: ProductOrder,
    limit: Option<i64>,
) -> Result<Vec<ProductViewRow>, DbError> {
    let mut sql = format!(
        "SELECT {VIEW_COLUMNS} FROM product_view {} ORDER BY {}",
        where_clause(filter),
        order.sql(),
    );
    if limit.is_some() {
        sql.push_str(" LIMIT $5");
    }

    let mut query = sqlx::query_as::<_, ProductViewRow>(&sql)
        .bind(&filter.shop)
        .bind(&filter.name_ilike)
        .bind(&filter.external_beer_ref_eq)
        .bind(filter.stale_untappd_days);
    if let Some(limit) = limit {
        query = query.bind(limit);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}

/// Counts matching rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(pool: &PgPool, filter: &ProductFilter) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM product_view {}", where_clause(filter));
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(&filter.shop)
        .bind(&filter.name_ilike)
        .bind(&filter.external_beer_ref_eq)
        .bind(filter.stale_untappd_days)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
