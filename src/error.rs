//! Error types for the pipeline stages.
//!
//! Per-article problems (one failed query, one unreachable page, one
//! unparseable verdict) are logged and absorbed by the stage that hit them.
//! Only the variants of [`PipelineError`] abort a run.

use thiserror::Error;

/// Errors that abort the current run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every search query failed.
    #[error("all {attempted} search queries failed; no articles fetched")]
    FetchExhausted { attempted: usize },

    /// The LLM call for report synthesis failed after retries.
    #[error("report generation failed: {0}")]
    ReportGenerationFailed(#[source] LlmError),

    #[error("missing API key: set {0} in the environment or .env file")]
    MissingApiKey(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no input file found in {0}")]
    NoInputFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// A single failed HTTP exchange with the search API or an article page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error("no paragraph content found")]
    NoContent,
}

/// Errors from the chat-completions API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("API response contained no message content")]
    EmptyResponse,
}

impl LlmError {
    /// Rate limits, server errors and transport failures are worth retrying;
    /// authentication and request errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Status { status, .. } => {
                status.as_u16() == 429 || status.is_server_error()
            }
            LlmError::EmptyResponse => false,
        }
    }
}
