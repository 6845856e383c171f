//! Operations on the `breweries` relation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BreweryRow {
    pub external_url: String,
    pub name_latin: Option<String>,
    pub name_native: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub location: Option<String>,
    pub brewery_type: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub stats: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

const BREWERY_COLUMNS: &str = "external_url, name_latin, name_native, aliases, location, \
     brewery_type, website, logo_url, stats, updated_at";

/// Fetches one brewery by its external URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the read fails.
pub async fn get_brewery_by_url(
    pool: &PgPool,
    external_url: &str,
) -> Result<Option<BreweryRow>, DbError> {
    let sql = format!("SELECT {BREWERY_COLUMNS} FROM breweries WHERE external_url = $1");
    let row = sqlx::query_as::<_, BreweryRow>(&sql)
        .bind(external_url)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Loads every brewery, for building the in-memory name index.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the read fails.
pub async fn list_breweries(pool: &PgPool) -> Result<Vec<BreweryRow>, DbError> {
    let sql = format!("SELECT {BREWERY_COLUMNS} FROM breweries ORDER BY external_url");
    let rows = sqlx::query_as::<_, BreweryRow>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Writes or refreshes a brewery row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the write fails.
pub async fn upsert_brewery(pool: &PgPool, row: &BreweryRow) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO breweries \
             (external_url, name_latin, name_native, aliases, location, \
              brewery_type, website, logo_url, stats, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
         ON CONFLICT (external_url) DO UPDATE SET \
             name_latin   = EXCLUDED.name_latin, \
             name_native  = EXCLUDED.name_native, \
             aliases      = EXCLUDED.aliases, \
             location     = EXCLUDED.location, \
             brewery_type = EXCLUDED.brewery_type, \
             website      = EXCLUDED.website, \
             logo_url     = EXCLUDED.logo_url, \
             stats        = EXCLUDED.stats, \
             updated_at   = NOW()",
    )
    .bind(&row.external_url)
    .bind(&row.name_latin)
    .bind(&row.name_native)
    .bind(&row.aliases)
    .bind(&row.location)
    .bind(&row.brewery_type)
    .bind(&row.website)
    .bind(&row.logo_url)
    .bind(&row.stats)
    .execute(pool)
    .await?;
    Ok(())
}
