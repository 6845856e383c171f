use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model {model} reported resource exhaustion")]
    ResourceExhausted { model: String },

    #[error("both models exhausted their quota")]
    QuotaExhausted,

    #[error("daily request budget of {budget} reached")]
    BudgetExhausted { budget: u32 },

    #[error("model API error: {0}")]
    ApiError(String),
}

impl ExtractorError {
    /// True for the terminal quota states that should abort the extraction
    /// stage rather than skip one product.
    #[must_use]
    pub fn is_fatal_quota(&self) -> bool {
        matches!(
            self,
            Self::QuotaExhausted | Self::BudgetExhausted { .. }
        )
    }
}
