use std::collections::HashMap;
use std::env::VarError;

use super::build_app_config;
use crate::ConfigError;

fn lookup_from<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key: &str| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn requires_store_url() {
    let map = HashMap::new();
    let err = build_app_config(lookup_from(&map)).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "CATALOG_STORE_URL"));
}

#[test]
fn accepts_database_url_fallback() {
    let mut map = HashMap::new();
    map.insert("DATABASE_URL", "postgres://localhost/hopdb");
    let config = build_app_config(lookup_from(&map)).expect("config should load");
    assert_eq!(config.database_url, "postgres://localhost/hopdb");
}

#[test]
fn catalog_store_url_wins_over_database_url() {
    let mut map = HashMap::new();
    map.insert("CATALOG_STORE_URL", "postgres://store/hopdb");
    map.insert("DATABASE_URL", "postgres://other/hopdb");
    let config = build_app_config(lookup_from(&map)).expect("config should load");
    assert_eq!(config.database_url, "postgres://store/hopdb");
}

#[test]
fn defaults_are_applied() {
    let mut map = HashMap::new();
    map.insert("CATALOG_STORE_URL", "postgres://localhost/hopdb");
    let config = build_app_config(lookup_from(&map)).expect("config should load");

    assert_eq!(config.sold_out_threshold, 30);
    assert_eq!(config.refresh_concurrency, 10);
    assert_eq!(config.refresh_batch_size, 20);
    assert_eq!(config.scraper_page_batch, 10);
    assert!(config.llm_api_key.is_none());
    assert_eq!(config.log_level, "info");
}

#[test]
fn empty_llm_key_counts_as_absent() {
    let mut map = HashMap::new();
    map.insert("CATALOG_STORE_URL", "postgres://localhost/hopdb");
    map.insert("LLM_API_KEY", "");
    let config = build_app_config(lookup_from(&map)).expect("config should load");
    assert!(config.llm_api_key.is_none());
}

#[test]
fn rejects_zero_sold_out_threshold() {
    let mut map = HashMap::new();
    map.insert("CATALOG_STORE_URL", "postgres://localhost/hopdb");
    map.insert("SCRAPER_SOLD_OUT_THRESHOLD", "0");
    let err = build_app_config(lookup_from(&map)).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn rejects_non_numeric_threshold() {
    let mut map = HashMap::new();
    map.insert("CATALOG_STORE_URL", "postgres://localhost/hopdb");
    map.insert("SCRAPER_SOLD_OUT_THRESHOLD", "many");
    let err = build_app_config(lookup_from(&map)).unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "SCRAPER_SOLD_OUT_THRESHOLD")
    );
}
