//! Operations on the `products` relation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{DbError, UPSERT_CHUNK_SIZE};

/// A full row from `products`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
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
}

/// The slice of a product the orchestrator needs to merge a new sighting:
/// identity, the previous status for restock detection, and the timestamp to
/// preserve.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KnownProduct {
    pub product_url: String,
    pub first_seen: DateTime<Utc>,
    pub stock_status: String,
    pub external_beer_ref: Option<String>,
}

/// One write-ready product row. `first_seen` is fully resolved by the caller:
/// the preserved prior value for a plain re-sighting, or a fresh timestamp for
/// a new item or restock. The upsert never touches `external_beer_ref`, so a
/// previously-set link survives every scrape.
#[derive(Debug, Clone)]
pub struct ProductUpsert {
    pub product_url: String,
    pub name: String,
    pub price_text: Option<String>,
    pub price_numeric: Option<i32>,
    pub image_url: Option<String>,
    pub stock_status: String,
    pub shop: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Loads every known product in pages of 1000, keyed by URL at the call site.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any page read fails.
pub async fn load_known_products(pool: &PgPool) -> Result<Vec<KnownProduct>, DbError> {
    const PAGE: i64 = 1000;
    let mut all = Vec::new();
    let mut offset: i64 = 0;

    loop {
        let page = sqlx::query_as::<_, KnownProduct>(
            "SELECT product_url, first_seen, stock_status, external_beer_ref \
             FROM products \
             ORDER BY product_url \
             LIMIT $1 OFFSET $2",
        )
        .bind(PAGE)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let fetched = page.len();
        all.extend(page);
        if fetched < usize::try_from(PAGE).unwrap_or(usize::MAX) {
            break;
        }
        offset += PAGE;
    }

    Ok(all)
}

/// Upserts a batch of products, chunked at [`UPSERT_CHUNK_SIZE`] rows.
///
/// Duplicate URLs within the batch resolve last-writer (Postgres rejects a
/// multi-row upsert that touches the same key twice, so earlier duplicates
/// are dropped here before binding).
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any chunk fails; rows from chunks that
/// completed before the failure remain persisted.
pub async fn upsert_products(pool: &PgPool, batch: &[ProductUpsert]) -> Result<usize, DbError> {
    let deduped = dedup_last_writer(batch);
    let mut written = 0usize;

    for chunk in deduped.chunks(UPSERT_CHUNK_SIZE) {
        let mut urls = Vec::with_capacity(chunk.len());
        let mut names = Vec::with_capacity(chunk.len());
        let mut price_texts = Vec::with_capacity(chunk.len());
        let mut price_numerics = Vec::with_capacity(chunk.len());
        let mut image_urls = Vec::with_capacity(chunk.len());
        let mut statuses = Vec::with_capacity(chunk.len());
        let mut shops = Vec::with_capacity(chunk.len());
        let mut first_seens = Vec::with_capacity(chunk.len());
        let mut last_seens = Vec::with_capacity(chunk.len());

        for row in chunk {
            urls.push(row.product_url.clone());
            names.push(row.name.clone());
            price_texts.push(row.price_text.clone());
            price_numerics.push(row.price_numeric);
            image_urls.push(row.image_url.clone());
            statuses.push(row.stock_status.clone());
            shops.push(row.shop.clone());
            first_seens.push(row.first_seen);
            last_seens.push(row.last_seen);
        }

        sqlx::query(
            "INSERT INTO products \
                 (product_url, name, price_text, price_numeric, image_url, \
                  stock_status, shop, first_seen, last_seen) \
             SELECT * FROM UNNEST( \
                 $1::TEXT[], $2::TEXT[], $3::TEXT[], $4::INT[], $5::TEXT[], \
                 $6::TEXT[], $7::TEXT[], $8::TIMESTAMPTZ[], $9::TIMESTAMPTZ[]) \
             ON CONFLICT (product_url) DO UPDATE SET \
                 name          = EXCLUDED.name, \
                 price_text    = EXCLUDED.price_text, \
                 price_numeric = EXCLUDED.price_numeric, \
                 image_url     = EXCLUDED.image_url, \
                 stock_status  = EXCLUDED.stock_status, \
                 shop          = EXCLUDED.shop, \
                 first_seen    = EXCLUDED.first_seen, \
                 last_seen     = EXCLUDED.last_seen",
        )
        .bind(&urls)
        .bind(&names)
        .bind(&price_texts)
        .bind(&price_numerics)
        .bind(&image_urls)
        .bind(&statuses)
        .bind(&shops)
        .bind(&first_seens)
        .bind(&last_seens)
        .execute(pool)
        .await?;

        written += chunk.len();
    }

    Ok(written)
}

/// Sets the external beer link on a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_product_ref(
    pool: &PgPool,
    product_url: &str,
    external_url: &str,
) -> Result<(), DbError> {
    sqlx::query("UPDATE products SET external_beer_ref = $2 WHERE product_url = $1")
        .bind(product_url)
        .bind(external_url)
        .execute(pool)
        .await?;
    Ok(())
}

/// Applies one stock-refresh result: `last_seen` always advances; the status
/// and price columns are only written when the refresher observed a change.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_product_stock(
    pool: &PgPool,
    product_url: &str,
    stock_status: Option<&str>,
    price_text: Option<&str>,
    price_numeric: Option<i32>,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE products SET \
             last_seen     = NOW(), \
             stock_status  = COALESCE($2, stock_status), \
             price_text    = COALESCE($3, price_text), \
             price_numeric = COALESCE($4, price_numeric) \
         WHERE product_url = $1",
    )
    .bind(product_url)
    .bind(stock_status)
    .bind(price_text)
    .bind(price_numeric)
    .execute(pool)
    .await?;
    Ok(())
}

/// Keeps only the last occurrence of each `product_url`, preserving relative
/// order of the survivors.
fn dedup_last_writer(batch: &[ProductUpsert]) -> Vec<ProductUpsert> {
    use std::collections::HashMap;

    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (i, row) in batch.iter().enumerate() {
        last_index.insert(row.product_url.as_str(), i);
    }

    batch
        .iter()
        .enumerate()
        .filter(|(i, row)| last_index.get(row.product_url.as_str()) == Some(i))
        .map(|(_, row)| row.clone())
        .collect()
}
