//! LLM-backed name extraction: decomposes a shop listing title into brewery
//! and beer names, with primary/secondary model fallback and daily budget
//! enforcement.

pub mod client;
pub mod error;
pub mod limiter;
mod prompt;
pub mod types;

pub use client::LlmClient;
pub use error::ExtractorError;
pub use limiter::{RateLimiter, PRIMARY_MODEL, SECONDARY_MODEL};
pub use types::NameExtraction;
