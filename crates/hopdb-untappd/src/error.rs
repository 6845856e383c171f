use thiserror::Error;

#[derive(Debug, Error)]
pub enum UntappdError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid CSS selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
}
