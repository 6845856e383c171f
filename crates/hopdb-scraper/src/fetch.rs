//! Shared HTTP fetch layer for the shop scrapers.
//!
//! One pooled client serves every shop except the retailer whose server only
//! negotiates legacy cipher suites; that one gets a dedicated native-TLS
//! client with the minimum protocol version lowered.

use std::time::Duration;

use encoding_rs::Encoding;
use reqwest::Client;

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;

/// HTTP client pair for list and detail pages.
///
/// Responses are returned as raw bytes and decoded by [`decode_body`] against
/// a shop-preferred encoding list, because several of the retailers serve
/// EUC-JP or Shift_JIS without a usable charset header.
pub struct PageFetcher {
    client: Client,
    legacy_client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl PageFetcher {
    /// Creates a fetcher with the given timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if either underlying client cannot be
    /// constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // The legacy retailer's server still offers small DH parameters,
        // which rustls rejects outright. native-tls with TLS 1.0 allowed is
        // the only client that completes the handshake.
        let legacy_client = Client::builder()
            .use_native_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_0)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            legacy_client,
            max_retries: 2,
            backoff_base_secs: 1,
        })
    }

    /// Fetches `url` and decodes the body against `encodings` in order.
    ///
    /// `legacy_tls` routes the request through the dedicated legacy client.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::NotFound`] on HTTP 404 (callers treat this as the
    ///   end of pagination).
    /// - [`ScraperError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ScraperError::Http`] on network failure after retries.
    pub async fn fetch_page(
        &self,
        url: &str,
        encodings: &[&'static Encoding],
        legacy_tls: bool,
    ) -> Result<String, ScraperError> {
        let client = if legacy_tls {
            &self.legacy_client
        } else {
            &self.client
        };

        let bytes = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.to_owned();
            async move {
                let response = client.get(&url).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound { url });
                }
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                Ok(response.bytes().await?)
            }
        })
        .await?;

        Ok(decode_body(&bytes, encodings))
    }
}

/// Decodes `bytes` by trying each encoding strictly in order; the first one
/// that decodes without errors wins. If none do, falls back to lossy UTF-8
/// with replacement characters, matching the error table's "continue with
/// replacement" disposition.
pub fn decode_body(bytes: &[u8], encodings: &[&'static Encoding]) -> String {
    for encoding in encodings {
        let (text, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return text.into_owned();
        }
    }
    tracing::debug!(
        tried = encodings.len(),
        "no candidate encoding decoded cleanly, falling back to lossy UTF-8"
    );
    String::from_utf8_lossy(bytes).into_owned()
}
