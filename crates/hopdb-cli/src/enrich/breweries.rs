//! Stage 3: fetch brewery pages for every brewery URL the beer cache knows
//! about and keep the brewery table current.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use hopdb_core::{AppConfig, CancelFlag, EnrichmentRules};
use hopdb_db::{get_brewery_by_url, list_brewery_urls, upsert_brewery, BreweryRow};
use hopdb_untappd::UntappdClient;

/// A brewery re-fetched within this window is left alone unless `--force`.
const FRESH_DAYS: i64 = 7;

const FETCH_DELAY: Duration = Duration::from_secs(2);

pub(crate) async fn run_breweries(
    pool: &PgPool,
    config: &AppConfig,
    cancel: &CancelFlag,
    limit: usize,
    force: bool,
    targets: &[String],
) -> anyhow::Result<()> {
    let urls = if targets.is_empty() {
        list_brewery_urls(pool).await?
    } else {
        targets.to_vec()
    };
    let rules = EnrichmentRules::load(&config.rules_path)?;
    let client = UntappdClient::new(config.untappd_request_timeout_secs)?;
    tracing::info!(candidates = urls.len(), force, "starting brewery enrichment");

    let mut processed = 0usize;
    let mut written = 0usize;
    let mut fresh = 0usize;
    let mut failures = 0usize;

    for url in &urls {
        if cancel.is_cancelled() {
            tracing::warn!("cancelled, stopping brewery enrichment");
            break;
        }
        if processed >= limit {
            break;
        }
        let existing = get_brewery_by_url(pool, url).await?;
        if let Some(existing) = &existing {
            let age = Utc::now() - existing.updated_at;
            if !force && age < chrono::Duration::days(FRESH_DAYS) {
                fresh += 1;
                continue;
            }
        }
        processed += 1;

        tokio::time::sleep(FETCH_DELAY).await;
        let detail = match client.fetch_brewery(url).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "brewery fetch failed, skipping");
                failures += 1;
                continue;
            }
        };

        // Native names and hand-curated aliases survive a refresh; aliases
        // are only generated when the row is new.
        let aliases = match &existing {
            Some(existing) => existing.aliases.clone(),
            None => Some(rules.generate_aliases(detail.name.as_deref(), None)),
        };
        tracing::info!(url = %url, name = detail.name.as_deref().unwrap_or("?"), "brewery updated");
        upsert_brewery(
            pool,
            &BreweryRow {
                external_url: url.clone(),
                name_latin: detail.name,
                name_native: existing.as_ref().and_then(|e| e.name_native.clone()),
                aliases,
                location: detail.location,
                brewery_type: detail.brewery_type,
                website: detail.website,
                logo_url: detail.logo_url,
                stats: detail.stats,
                // Overwritten by NOW() in the upsert.
                updated_at: Utc::now(),
            },
        )
        .await?;
        written += 1;
    }

    println!(
        "brewery enrichment finished: {written} written, {fresh} fresh, {failures} failed"
    );
    Ok(())
}
