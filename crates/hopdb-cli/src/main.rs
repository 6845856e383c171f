mod enrich;
mod scrape;
mod stock;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hopdb")]
#[command(about = "Craft beer catalog pipeline: scrape, enrich, refresh")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every shop and merge the sightings into the catalog
    Scrape {
        /// Cap items per shop
        #[arg(long)]
        limit: Option<usize>,

        /// Stop each shop after a streak of already-known listings and skip
        /// upserting known products (restocks still go through)
        #[arg(long = "new")]
        new_only: bool,

        /// Walk every page, disabling the sold-out early stop
        #[arg(long = "full")]
        full_scrape: bool,

        /// Recompute first_seen for every sighting
        #[arg(long = "reset-dates")]
        reset_dates: bool,
    },
    /// Run the full enrichment pipeline (extraction, matching, breweries)
    Enrich {
        /// Items per stage
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Restrict to one shop (by slug or label)
        #[arg(long)]
        shop: Option<String>,

        /// Restrict to listings whose name contains this substring
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Stage 1 only: extract brewery and beer names with the language model
    EnrichGemini {
        #[arg(long, default_value_t = 50)]
        limit: usize,

        #[arg(long)]
        shop: Option<String>,

        #[arg(long)]
        keyword: Option<String>,

        /// Skip all LLM calls; only process rows that already carry names
        #[arg(long)]
        offline: bool,

        /// Re-extract even when names are already present
        #[arg(long)]
        force: bool,
    },
    /// Stage 2 only: match extractions against the external beer catalog
    EnrichUntappd {
        #[arg(long, default_value_t = 50)]
        limit: usize,

        #[arg(long, value_enum, default_value_t = MatchMode::Missing)]
        mode: MatchMode,

        #[arg(long)]
        shop: Option<String>,

        /// Restrict to listings whose name contains this substring
        #[arg(long = "name-filter")]
        name_filter: Option<String>,
    },
    /// Stage 3 only: fetch brewery details for known brewery URLs
    EnrichBreweries {
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Refresh even breweries fetched within the freshness window
        #[arg(long)]
        force: bool,

        /// Specific brewery URLs to process instead of discovering them
        #[arg(long, num_args = 1..)]
        targets: Vec<String>,
    },
    /// Re-check stock status and price on product detail pages
    UpdateStock {
        #[arg(long)]
        limit: Option<i64>,

        #[arg(long)]
        shop: Option<String>,

        /// Process highest-rated beers first
        #[arg(long)]
        sort_rating: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatchMode {
    /// Find links for products that have none
    Missing,
    /// Re-scrape details for stale linked products
    Refresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = hopdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = hopdb_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    };
    let pool = hopdb_db::connect_pool(&config.database_url, pool_config).await?;
    hopdb_db::run_migrations(&pool).await?;

    // Ctrl-C winds the batch loops down between items instead of killing
    // in-flight writes.
    let cancel = hopdb_core::CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, finishing the current item");
                cancel.cancel();
            }
        });
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Scrape {
            limit,
            new_only,
            full_scrape,
            reset_dates,
        } => {
            scrape::run_scrape(&pool, &config, &cancel, limit, new_only, full_scrape, reset_dates)
                .await
        }
        Commands::Enrich {
            limit,
            shop,
            keyword,
        } => {
            enrich::run_pipeline(&pool, &config, &cancel, limit, shop.as_deref(), keyword.as_deref())
                .await
        }
        Commands::EnrichGemini {
            limit,
            shop,
            keyword,
            offline,
            force,
        } => {
            enrich::extract::run_extract(
                &pool,
                &config,
                &cancel,
                limit,
                shop.as_deref(),
                keyword.as_deref(),
                offline,
                force,
            )
            .await
            .map(|_| ())
        }
        Commands::EnrichUntappd {
            limit,
            mode,
            shop,
            name_filter,
        } => {
            let mode = match mode {
                MatchMode::Missing => enrich::untappd::MatchMode::Missing,
                MatchMode::Refresh => enrich::untappd::MatchMode::Refresh,
            };
            enrich::untappd::run_match(
                &pool,
                &config,
                &cancel,
                limit,
                mode,
                shop.as_deref(),
                name_filter.as_deref(),
                None,
            )
            .await
            .map(|_| ())
        }
        Commands::EnrichBreweries {
            limit,
            force,
            targets,
        } => {
            enrich::breweries::run_breweries(&pool, &config, &cancel, limit, force, &targets).await
        }
        Commands::UpdateStock {
            limit,
            shop,
            sort_rating,
        } => {
            stock::run_update_stock(&pool, &config, &cancel, limit, shop.as_deref(), sort_rating)
                .await
        }
    }
}
