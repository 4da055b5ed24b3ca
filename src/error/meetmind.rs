use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::error;

use super::polar::PolarError;

#[derive(Debug, ThisError)]
pub enum MeetmindError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Polar(#[from] PolarError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl MeetmindError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        MeetmindError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            MeetmindError::BadRequest(_) => StatusCode::BAD_REQUEST,
            MeetmindError::Unauthorized => StatusCode::UNAUTHORIZED,
            MeetmindError::NotFound(_) => StatusCode::NOT_FOUND,
            MeetmindError::Conflict(_) => StatusCode::CONFLICT,
            MeetmindError::DatabaseError(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                StatusCode::CONFLICT
            }
            MeetmindError::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            MeetmindError::Polar(PolarError::MissingAccessToken) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            MeetmindError::Polar(_) => StatusCode::BAD_GATEWAY,
            MeetmindError::JsonError(_)
            | MeetmindError::RenderError(_)
            | MeetmindError::UnexpectedError(_)
            | MeetmindError::RactorError(_)
            | MeetmindError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            MeetmindError::BadRequest(msg) | MeetmindError::Conflict(msg) => msg.clone(),
            MeetmindError::Unauthorized => "Unauthorized".to_string(),
            MeetmindError::NotFound(what) => (*what).to_string(),
            MeetmindError::DatabaseError(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                "Resource already exists".to_string()
            }
            MeetmindError::DatabaseError(sqlx::Error::RowNotFound) => "Not found".to_string(),
            MeetmindError::Polar(PolarError::MissingAccessToken) => {
                "Polar access token not configured".to_string()
            }
            MeetmindError::Polar(_) => "Upstream service error.".to_string(),
            _ => "An internal server error occurred.".to_string(),
        }
    }
}

impl IntoResponse for MeetmindError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = ApiErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Standardized API error response payload: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}
