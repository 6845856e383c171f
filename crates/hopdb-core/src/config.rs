use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup and no
/// `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    // CATALOG_STORE_URL is the canonical key; DATABASE_URL is accepted so
    // standard Postgres tooling works against the same .env.
    let database_url = lookup("CATALOG_STORE_URL")
        .or_else(|_| lookup("DATABASE_URL"))
        .map_err(|_| ConfigError::MissingEnvVar("CATALOG_STORE_URL".to_string()))?;

    let llm_api_key = lookup("LLM_API_KEY").ok().filter(|k| !k.is_empty());

    let log_level = or_default("HOPDB_LOG_LEVEL", "info");
    let rules_path = PathBuf::from(or_default("HOPDB_RULES_PATH", "./config/enrichment.yaml"));

    let db_max_connections = parse_u32("HOPDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("HOPDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("HOPDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let sold_out_threshold = parse_u32("SCRAPER_SOLD_OUT_THRESHOLD", "30")?;
    if sold_out_threshold == 0 {
        return Err(ConfigError::Validation(
            "SCRAPER_SOLD_OUT_THRESHOLD must be at least 1".to_string(),
        ));
    }

    let scraper_request_timeout_secs = parse_u64("HOPDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "HOPDB_SCRAPER_USER_AGENT",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    );
    let scraper_page_batch = parse_usize("HOPDB_SCRAPER_PAGE_BATCH", "10")?;

    let untappd_request_timeout_secs = parse_u64("HOPDB_UNTAPPD_REQUEST_TIMEOUT_SECS", "10")?;
    let llm_request_timeout_secs = parse_u64("HOPDB_LLM_REQUEST_TIMEOUT_SECS", "30")?;
    let llm_daily_budget = parse_u32("HOPDB_LLM_DAILY_BUDGET", "14400")?;

    let refresh_concurrency = parse_usize("HOPDB_REFRESH_CONCURRENCY", "10")?;
    let refresh_batch_size = parse_usize("HOPDB_REFRESH_BATCH_SIZE", "20")?;

    Ok(AppConfig {
        database_url,
        llm_api_key,
        log_level,
        rules_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        sold_out_threshold,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_page_batch,
        untappd_request_timeout_secs,
        llm_request_timeout_secs,
        llm_daily_budget,
        refresh_concurrency,
        refresh_batch_size,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
