use super::IsRetryable;
use reqwest::StatusCode;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PolarError {
    #[error("Polar access token not configured")]
    MissingAccessToken,

    #[error("Polar upstream error with status {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("Polar request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Polar payload parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Polar URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl IsRetryable for PolarError {
    fn is_retryable(&self) -> bool {
        match self {
            PolarError::Request(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            PolarError::UpstreamStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}
