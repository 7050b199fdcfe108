use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the client.
///
/// `RateLimited` and `Challenge` are the transient upstream classes: the
/// caller may retry the whole operation after backing off. Everything else
/// is fatal for the current call.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or incomplete configuration, including credentials.
    #[error("configuration error: {0}")]
    Config(String),

    /// The site explicitly rejected the supplied credentials. Carries the
    /// full response payload for diagnostics.
    #[error("login rejected: {detail}")]
    Auth { detail: String },

    /// The site answered with HTTP 429.
    #[error("rate limited by the site")]
    RateLimited,

    /// The request was intercepted by an anti-bot challenge page rather
    /// than reaching the application.
    #[error("request intercepted by an anti-bot challenge")]
    Challenge,

    /// A response did not have the expected shape. Usually means the site
    /// layout or API changed.
    #[error("unexpected response shape: {0}")]
    Protocol(String),

    /// Cookie or config file access failure. Corrupt files surface as
    /// `InvalidData`.
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// An unexpected HTTP status with no more specific classification.
    #[error("unexpected HTTP status {status}")]
    Http { status: StatusCode },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether the error is worth retrying after a backoff. Retries are
    /// never performed internally.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::RateLimited | ApiError::Challenge)
    }
}
