use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    /// Postgres connection string for the catalog store.
    pub database_url: String,
    /// Credential for the extraction model. Absent disables Stage 1.
    pub llm_api_key: Option<String>,
    pub log_level: String,
    /// Path to the enrichment rules YAML (style suffixes, alias stop words).
    pub rules_path: PathBuf,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    /// Consecutive sold-out items before a scraper stops paginating.
    pub sold_out_threshold: u32,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Pages fetched concurrently by scrapers that batch their pagination.
    pub scraper_page_batch: usize,

    pub untappd_request_timeout_secs: u64,
    pub llm_request_timeout_secs: u64,
    /// Hard cap on extraction calls per process day.
    pub llm_daily_budget: u32,

    /// Concurrent page fetches in the stock refresher.
    pub refresh_concurrency: usize,
    /// Items per refresher chunk; a short sleep separates chunks.
    pub refresh_batch_size: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "[redacted]"))
            .field("log_level", &self.log_level)
            .field("rules_path", &self.rules_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("sold_out_threshold", &self.sold_out_threshold)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_page_batch", &self.scraper_page_batch)
            .field(
                "untappd_request_timeout_secs",
                &self.untappd_request_timeout_secs,
            )
            .field("llm_request_timeout_secs", &self.llm_request_timeout_secs)
            .field("llm_daily_budget", &self.llm_daily_budget)
            .field("refresh_concurrency", &self.refresh_concurrency)
            .field("refresh_batch_size", &self.refresh_batch_size)
            .finish()
    }
}
