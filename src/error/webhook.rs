use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use thiserror::Error as ThisError;

use super::meetmind::MeetmindError;

/// Failures of `POST /api/polar/webhook`; every body carries a timestamp.
#[derive(Debug, ThisError)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Webhook processing failed: {0}")]
    Processing(#[from] MeetmindError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> axum::response::Response {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let (status, body) = match &self {
            WebhookError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid webhook signature", "timestamp": timestamp }),
            ),
            WebhookError::InvalidPayload(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid JSON payload", "timestamp": timestamp }),
            ),
            WebhookError::Processing(inner) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Webhook processing failed",
                    "message": inner.public_message(),
                    "timestamp": timestamp,
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
