use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("User did not log in within {0:?}")]
    AuthenticationTimeout(Duration),

    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    #[error("Browser error: {0}")]
    Browser(#[from] scout_browser::BrowserError),
}

/// Failures while pairing list summaries with detail responses.
#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("Request to {url} failed: {reason}")]
    FailedExchange { url: String, reason: String },

    #[error("Malformed response from {url}: {reason}")]
    MalformedBody { url: String, reason: String },

    #[error("Detail for {job_id} arrived without a list summary")]
    MissingSummary { job_id: String },

    #[error("No detail response within {0:?} of the click")]
    DetailTimeout(Duration),

    #[error("The {0} response stream closed")]
    StreamClosed(&'static str),
}

pub type Result<T> = std::result::Result<T, ScanError>;
