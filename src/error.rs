use thiserror::Error;

use crate::retry::RetryError;

/// Startup configuration problems. Fatal: the process refuses to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration `{0}`")]
    Missing(&'static str),

    #[error("invalid value for `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// A single failed feed attempt.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed feed document: {0}")]
    Parse(#[from] quick_xml::DeError),
}

/// Feed fetch gave up after exhausting retries. Aborts the current run only.
#[derive(Debug, Error)]
#[error("feed unavailable after {attempts} attempt(s): {source}")]
pub struct FetchError {
    pub attempts: u32,
    pub source: FeedError,
}

impl From<RetryError<FeedError>> for FetchError {
    fn from(e: RetryError<FeedError>) -> Self {
        Self {
            attempts: e.attempts,
            source: e.last,
        }
    }
}

/// A single failed webhook attempt.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl WebhookError {
    /// Network errors, 5xx, and rate limiting are worth retrying; any other
    /// rejection means the payload itself was refused.
    pub fn is_transient(&self) -> bool {
        match self {
            WebhookError::Http(_) => true,
            WebhookError::Rejected { status, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
        }
    }
}

/// Webhook delivery gave up after exhausting retries. Aborts the current run only.
#[derive(Debug, Error)]
#[error("webhook delivery failed after {attempts} attempt(s): {source}")]
pub struct DeliveryError {
    pub attempts: u32,
    pub source: WebhookError,
}

impl From<RetryError<WebhookError>> for DeliveryError {
    fn from(e: RetryError<WebhookError>) -> Self {
        Self {
            attempts: e.attempts,
            source: e.last,
        }
    }
}
