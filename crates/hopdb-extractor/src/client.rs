//! HTTP client for the `generateContent` endpoint of the model backend.
//!
//! One call per product title. The client drives the [`RateLimiter`] state
//! machine: pace, call the current model, and on resource exhaustion demote
//! to the secondary and retry once. Exhaustion on the secondary is fatal for
//! the stage.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::ExtractorError;
use crate::limiter::RateLimiter;
use crate::prompt::build_prompt;
use crate::types::{strip_code_fences, NameExtraction};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl LlmClient {
    /// Creates a client pointed at the production backend.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ExtractorError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Http`] on client construction failure or
    /// [`ExtractorError::ApiError`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ExtractorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ExtractorError::ApiError(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Extracts names from one product title, falling back to the secondary
    /// model on a resource-exhausted response.
    ///
    /// # Errors
    ///
    /// - [`ExtractorError::BudgetExhausted`] when the daily budget is spent
    ///   (no network call is made).
    /// - [`ExtractorError::QuotaExhausted`] when both models report
    ///   exhaustion.
    /// - [`ExtractorError::Deserialize`] when the model output is not the
    ///   expected JSON object.
    /// - [`ExtractorError::Http`] / [`ExtractorError::ApiError`] on
    ///   transport or backend failures.
    pub async fn extract(
        &self,
        limiter: &mut RateLimiter,
        product_name: &str,
        brewery_hint: Option<&str>,
    ) -> Result<NameExtraction, ExtractorError> {
        if limiter.budget_spent() {
            return Err(ExtractorError::BudgetExhausted {
                budget: limiter.budget(),
            });
        }

        let prompt = build_prompt(product_name, brewery_hint);

        limiter.wait_turn().await;
        let first = self
            .generate(limiter.current_model().id, &prompt, limiter)
            .await;

        match first {
            Err(ExtractorError::ResourceExhausted { model }) => {
                tracing::warn!(model, "resource exhausted, falling back once");
                if !limiter.fall_back() {
                    return Err(ExtractorError::QuotaExhausted);
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
                limiter.wait_turn().await;
                match self
                    .generate(limiter.current_model().id, &prompt, limiter)
                    .await
                {
                    Err(ExtractorError::ResourceExhausted { .. }) => {
                        Err(ExtractorError::QuotaExhausted)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        limiter: &mut RateLimiter,
    ) -> Result<NameExtraction, ExtractorError> {
        let url = self.generate_url(model)?;
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(model, "calling generateContent");
        let response = self.client.post(url).json(&body).send().await?;
        limiter.record_call();

        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            && text.contains("RESOURCE_EXHAUSTED")
        {
            return Err(ExtractorError::ResourceExhausted {
                model: model.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(ExtractorError::ApiError(format!(
                "{model} returned HTTP {status}: {}",
                text.chars().take(200).collect::<String>()
            )));
        }

        let envelope: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| ExtractorError::Deserialize {
                context: format!("generateContent({model}) envelope"),
                source: e,
            })?;

        let raw = envelope
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or_default();

        serde_json::from_str(strip_code_fences(raw)).map_err(|e| ExtractorError::Deserialize {
            context: format!("generateContent({model}) payload"),
            source: e,
        })
    }

    fn generate_url(&self, model: &str) -> Result<Url, ExtractorError> {
        let mut url = self
            .base_url
            .join(&format!("models/{model}:generateContent"))
            .map_err(|e| ExtractorError::ApiError(format!("invalid model path: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
