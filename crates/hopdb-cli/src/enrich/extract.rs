//! Stage 1: decompose listing titles into brewery and beer names with the
//! extraction model.
//!
//! Selection covers every product still missing a Latin brewery name or an
//! external beer link, including rows that were matched from native names
//! alone and need their Latin fields backfilled. Rows whose stored names
//! are already complete are not re-sent to the model (unless `--force`);
//! they are carried forward so the matcher can pick them up. `--offline`
//! skips the model entirely and only carries existing names.

use sqlx::PgPool;

use hopdb_core::{AppConfig, CancelFlag};
use hopdb_db::{
    select_products, upsert_extraction, ExtractionUpsert, ProductFilter, ProductOrder,
    ProductViewRow,
};
use hopdb_extractor::{LlmClient, NameExtraction, RateLimiter};

use super::ExtractedNames;

pub(crate) async fn run_extract(
    pool: &PgPool,
    config: &AppConfig,
    cancel: &CancelFlag,
    limit: usize,
    shop: Option<&str>,
    keyword: Option<&str>,
    offline: bool,
    force: bool,
) -> anyhow::Result<ExtractedNames> {
    let shop = super::shop_label(shop)?;
    let name_ilike = super::keyword_pattern(keyword);

    let client = if offline {
        None
    } else {
        let Some(api_key) = config.llm_api_key.as_deref() else {
            anyhow::bail!("LLM_API_KEY is not set; pass --offline to run without the model");
        };
        Some(LlmClient::new(api_key, config.llm_request_timeout_secs)?)
    };
    let mut limiter = RateLimiter::new(config.llm_daily_budget);

    let index = super::load_brewery_index(pool).await?;
    tracing::info!(breweries = index.len(), "loaded brewery index");

    let rows = select_candidates(pool, &shop, &name_ilike, limit, offline).await?;
    tracing::info!(candidates = rows.len(), offline, force, "starting name extraction");

    let mut carriers = ExtractedNames::new();
    let mut extracted = 0usize;
    let mut carried = 0usize;
    let mut bundles = 0usize;
    let mut failures = 0usize;

    for row in &rows {
        if cancel.is_cancelled() {
            tracing::warn!("cancelled, stopping extraction");
            break;
        }
        if let Some(existing) = extraction_from_row(row) {
            if !force {
                if existing.is_bundle {
                    bundles += 1;
                    continue;
                }
                if carry_stored(&existing, client.is_none()) {
                    carriers.insert(row.product_url.clone(), existing);
                    carried += 1;
                    continue;
                }
            }
        }
        let Some(client) = &client else {
            // Offline and nothing stored for this row.
            continue;
        };

        let hint = index
            .find_in_text(&row.name)
            .and_then(|b| b.name_latin.as_deref());
        match client.extract(&mut limiter, &row.name, hint).await {
            Ok(extraction) => {
                persist(pool, row, &extraction, limiter.current_model().id).await?;
                if extraction.is_bundle {
                    bundles += 1;
                } else if extraction.has_any_name() {
                    carriers.insert(row.product_url.clone(), extraction);
                    extracted += 1;
                } else {
                    tracing::warn!(name = %row.name, "model returned no names");
                    failures += 1;
                }
            }
            Err(e) if e.is_fatal_quota() => {
                anyhow::bail!(
                    "extraction quota exhausted after {} calls: {e}",
                    limiter.calls_made()
                );
            }
            Err(e) => {
                tracing::warn!(name = %row.name, error = %e, "extraction failed, skipping");
                failures += 1;
            }
        }
    }

    println!(
        "extraction finished: {extracted} extracted, {carried} carried, \
         {bundles} bundles, {failures} failed ({} model calls)",
        limiter.calls_made()
    );
    Ok(carriers)
}

/// Online runs select every product whose Latin brewery name is still NULL
/// (never extracted, or matched from native names alone) or whose external
/// beer link is missing. Offline runs cannot call the model, so they select
/// only the extracted-but-unmatched rows that have stored names to carry.
async fn select_candidates(
    pool: &PgPool,
    shop: &Option<String>,
    name_ilike: &Option<String>,
    limit: usize,
    offline: bool,
) -> anyhow::Result<Vec<ProductViewRow>> {
    let base = ProductFilter {
        shop: shop.clone(),
        name_ilike: name_ilike.clone(),
        ..ProductFilter::default()
    };
    let filter = if offline {
        ProductFilter {
            has_extraction_missing_ref: true,
            missing_external_ref: true,
            ..base
        }
    } else {
        ProductFilter {
            missing_latin_or_external_ref: true,
            ..base
        }
    };

    let rows = select_products(pool, &filter, ProductOrder::FirstSeenDesc, Some(limit as i64))
        .await?;
    Ok(rows)
}

/// Whether a stored extraction is complete enough to skip the model. Both
/// Latin names present means there is nothing left to backfill; offline
/// runs carry anything with at least one name since they cannot call the
/// model anyway.
fn carry_stored(existing: &NameExtraction, offline: bool) -> bool {
    if offline {
        return existing.has_any_name();
    }
    existing.brewery_name_latin.is_some() && existing.beer_name_latin.is_some()
}

fn extraction_from_row(row: &ProductViewRow) -> Option<NameExtraction> {
    row.is_bundle.map(|is_bundle| NameExtraction {
        brewery_name_native: row.brewery_name_native.clone(),
        brewery_name_latin: row.brewery_name_latin.clone(),
        beer_name_native: row.beer_name_native.clone(),
        beer_name_latin: row.beer_name_latin.clone(),
        is_bundle,
    })
}

async fn persist(
    pool: &PgPool,
    row: &ProductViewRow,
    extraction: &NameExtraction,
    model_id: &str,
) -> anyhow::Result<()> {
    let raw_payload = serde_json::json!({
        "brewery_name_native": extraction.brewery_name_native,
        "brewery_name_latin": extraction.brewery_name_latin,
        "beer_name_native": extraction.beer_name_native,
        "beer_name_latin": extraction.beer_name_latin,
        "is_bundle": extraction.is_bundle,
        "model": model_id,
    });
    upsert_extraction(
        pool,
        &ExtractionUpsert {
            product_url: row.product_url.clone(),
            brewery_name_native: extraction.brewery_name_native.clone(),
            brewery_name_latin: extraction.brewery_name_latin.clone(),
            beer_name_native: extraction.beer_name_native.clone(),
            beer_name_latin: extraction.beer_name_latin.clone(),
            is_bundle: extraction.is_bundle,
            raw_payload: Some(raw_payload),
        },
    )
    .await?;
    Ok(())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
