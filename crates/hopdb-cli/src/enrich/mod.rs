//! The three enrichment stages and their shared plumbing.
//!
//! `enrich` chains all three: name extraction hands its fresh names to the
//! matcher in memory, and the matcher hands the brewery URLs it discovered
//! to the brewery stage. Each stage also runs standalone via its own
//! subcommand, reading whatever the previous stage persisted.

pub(crate) mod breweries;
pub(crate) mod extract;
pub(crate) mod untappd;

use std::collections::HashMap;

use sqlx::PgPool;

use hopdb_core::{AppConfig, BreweryIndex, BreweryRecord, CancelFlag, Shop};
use hopdb_db::DbError;
use hopdb_extractor::NameExtraction;

/// Freshly extracted names keyed by product URL, passed from the extraction
/// stage to the matcher so a chained run does not re-read what it just wrote.
pub(crate) type ExtractedNames = HashMap<String, NameExtraction>;

pub(crate) async fn run_pipeline(
    pool: &PgPool,
    config: &AppConfig,
    cancel: &CancelFlag,
    limit: usize,
    shop: Option<&str>,
    keyword: Option<&str>,
) -> anyhow::Result<()> {
    // Without a model credential, Stage 1 degrades to carrying stored names.
    let offline = config.llm_api_key.is_none();
    if offline {
        tracing::warn!("LLM_API_KEY not set, running extraction offline");
    }
    let extracted =
        extract::run_extract(pool, config, cancel, limit, shop, keyword, offline, false).await?;

    let brewery_urls = untappd::run_match(
        pool,
        config,
        cancel,
        limit,
        untappd::MatchMode::Missing,
        shop,
        keyword,
        Some(&extracted),
    )
    .await?;

    if brewery_urls.is_empty() {
        tracing::info!("no brewery urls discovered, skipping brewery stage");
        return Ok(());
    }
    breweries::run_breweries(pool, config, cancel, limit, false, &brewery_urls).await
}

/// Builds the in-memory brewery index from the store.
pub(crate) async fn load_brewery_index(pool: &PgPool) -> Result<BreweryIndex, DbError> {
    let rows = hopdb_db::list_breweries(pool).await?;
    let records = rows
        .into_iter()
        .map(|row| BreweryRecord {
            external_url: Some(row.external_url),
            name_latin: row.name_latin,
            name_native: row.name_native,
            aliases: row.aliases.unwrap_or_default(),
        })
        .collect();
    Ok(BreweryIndex::new(records))
}

/// Resolves a `--shop` argument (slug or label) to the persisted label.
pub(crate) fn shop_label(shop: Option<&str>) -> anyhow::Result<Option<String>> {
    match shop {
        None => Ok(None),
        Some(s) => match Shop::parse(s) {
            Some(shop) => Ok(Some(shop.label().to_string())),
            None => anyhow::bail!(
                "unknown shop {s:?} (expected one of: {})",
                Shop::ALL.map(|s| s.slug()).join(", ")
            ),
        },
    }
}

/// Turns a keyword into the `ILIKE` pattern the view filter expects.
pub(crate) fn keyword_pattern(keyword: Option<&str>) -> Option<String> {
    keyword.map(|k| format!("%{k}%"))
}
