//! Operations on the `external_beers` relation, the cached beer detail pages.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExternalBeerRow {
    pub external_url: String,
    pub beer_name: Option<String>,
    pub brewery_name: Option<String>,
    pub style: Option<String>,
    pub abv: Option<String>,
    pub ibu: Option<String>,
    pub rating: Option<String>,
    pub rating_count: Option<String>,
    pub image_url: Option<String>,
    pub external_brewery_url: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Fetches a cached beer detail by its external URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the read fails.
pub async fn get_external_beer(
    pool: &PgPool,
    external_url: &str,
) -> Result<Option<ExternalBeerRow>, DbError> {
    let row = sqlx::query_as::<_, ExternalBeerRow>(
        "SELECT external_url, beer_name, brewery_name, style, abv, ibu, \
                rating, rating_count, image_url, external_brewery_url, fetched_at \
         FROM external_beers WHERE external_url = $1",
    )
    .bind(external_url)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Distinct brewery URLs across every cached beer detail, for the brewery
/// enrichment stage.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the read fails.
pub async fn list_brewery_urls(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let urls = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT external_brewery_url FROM external_beers \
         WHERE external_brewery_url IS NOT NULL \
         ORDER BY external_brewery_url",
    )
    .fetch_all(pool)
    .await?;
    Ok(urls)
}

/// Writes or refreshes a beer detail row. A placeholder row (search URL with
/// no scraped fields) carries a NULL `fetched_at` so the matcher can tell it
/// apart from a real detail page; `fetched_at` is set only when `fetched` is
/// true.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the write fails.
pub async fn upsert_external_beer(
    pool: &PgPool,
    row: &ExternalBeerRow,
    fetched: bool,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO external_beers \
             (external_url, beer_name, brewery_name, style, abv, ibu, \
              rating, rating_count, image_url, external_brewery_url, fetched_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
                 CASE WHEN $11 THEN NOW() ELSE NULL END) \
         ON CONFLICT (external_url) DO UPDATE SET \
             beer_name            = EXCLUDED.beer_name, \
             brewery_name         = EXCLUDED.brewery_name, \
             style                = EXCLUDED.style, \
             abv                  = EXCLUDED.abv, \
             ibu                  = EXCLUDED.ibu, \
             rating               = EXCLUDED.rating, \
             rating_count         = EXCLUDED.rating_count, \
             image_url            = EXCLUDED.image_url, \
             external_brewery_url = EXCLUDED.external_brewery_url, \
             fetched_at           = CASE WHEN $11 THEN NOW() \
                                         ELSE external_beers.fetched_at END",
    )
    .bind(&row.external_url)
    .bind(&row.beer_name)
    .bind(&row.brewery_name)
    .bind(&row.style)
    .bind(&row.abv)
    .bind(&row.ibu)
    .bind(&row.rating)
    .bind(&row.rating_count)
    .bind(&row.image_url)
    .bind(&row.external_brewery_url)
    .bind(fetched)
    .execute(pool)
    .await?;
    Ok(())
}
