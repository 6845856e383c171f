//! Operations on the `extractions` relation, one row per product holding the
//! names the language model pulled out of the listing title.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExtractionRow {
    pub product_url: String,
    pub brewery_name_native: Option<String>,
    pub brewery_name_latin: Option<String>,
    pub beer_name_native: Option<String>,
    pub beer_name_latin: Option<String>,
    pub is_bundle: bool,
    pub external_beer_ref: Option<String>,
    pub raw_payload: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExtractionUpsert {
    pub product_url: String,
    pub brewery_name_native: Option<String>,
    pub brewery_name_latin: Option<String>,
    pub beer_name_native: Option<String>,
    pub beer_name_latin: Option<String>,
    pub is_bundle: bool,
    pub raw_payload: Option<serde_json::Value>,
}

/// Fetches the extraction for one product, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the read fails.
pub async fn get_extraction(
    pool: &PgPool,
    product_url: &str,
) -> Result<Option<ExtractionRow>, DbError> {
    let row = sqlx::query_as::<_, ExtractionRow>(
        "SELECT product_url, brewery_name_native, brewery_name_latin, \
                beer_name_native, beer_name_latin, is_bundle, \
                external_beer_ref, raw_payload, updated_at \
         FROM extractions WHERE product_url = $1",
    )
    .bind(product_url)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Writes or replaces the extraction for a product. The matching stage's
/// `external_beer_ref` is left alone so a re-run of name extraction does not
/// undo an existing match.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the write fails.
pub async fn upsert_extraction(pool: &PgPool, row: &ExtractionUpsert) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO extractions \
             (product_url, brewery_name_native, brewery_name_latin, \
              beer_name_native, beer_name_latin, is_bundle, raw_payload, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
         ON CONFLICT (product_url) DO UPDATE SET \
             brewery_name_native = EXCLUDED.brewery_name_native, \
             brewery_name_latin  = EXCLUDED.brewery_name_latin, \
             beer_name_native    = EXCLUDED.beer_name_native, \
             beer_name_latin     = EXCLUDED.beer_name_latin, \
             is_bundle           = EXCLUDED.is_bundle, \
             raw_payload         = EXCLUDED.raw_payload, \
             updated_at          = NOW()",
    )
    .bind(&row.product_url)
    .bind(&row.brewery_name_native)
    .bind(&row.brewery_name_latin)
    .bind(&row.beer_name_native)
    .bind(&row.beer_name_latin)
    .bind(row.is_bundle)
    .bind(&row.raw_payload)
    .execute(pool)
    .await?;
    Ok(())
}

/// Records the external beer an extraction was matched to.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_extraction_ref(
    pool: &PgPool,
    product_url: &str,
    external_url: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE extractions SET external_beer_ref = $2, updated_at = NOW() \
         WHERE product_url = $1",
    )
    .bind(product_url)
    .bind(external_url)
    .execute(pool)
    .await?;
    Ok(())
}
