pub mod app_config;
pub mod brewery_index;
pub mod cancel;
pub mod config;
pub mod rules;
pub mod types;

use thiserror::Error;

pub use app_config::AppConfig;
pub use brewery_index::{BreweryIndex, BreweryRecord};
pub use cancel::CancelFlag;
pub use config::{load_app_config, load_app_config_from_env};
pub use rules::EnrichmentRules;
pub use types::{parse_price_numeric, RawProduct, Shop, StockStatus};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read rules file {path}: {source}")]
    RulesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules file: {0}")]
    RulesFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
