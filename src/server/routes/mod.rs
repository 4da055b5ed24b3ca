pub mod agents;
pub mod orders;
pub mod payments;
pub mod reports;
pub mod users;
pub mod webhook;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::MeetmindError;

/// Unwraps a JSON body, turning extractor rejections into a 400 `{"error": ...}`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, MeetmindError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| MeetmindError::bad_request(e.body_text()))
}

/// A required text field: present and not blank, returned trimmed.
pub(crate) fn required(field: &str, value: Option<String>) -> Result<String, MeetmindError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MeetmindError::bad_request(format!("{field} is required")))
}

/// Dollars from the API to stored cents: `round(amount * 100)`.
pub(crate) fn to_cents(amount: f64) -> Result<i64, MeetmindError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(MeetmindError::bad_request(
            "amount must be a non-negative number",
        ));
    }
    Ok((amount * 100.0).round() as i64)
}

/// A downloadable file body with `Content-Disposition` and `Content-Length` set.
pub(crate) fn attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_round_half_away_from_zero() {
        assert_eq!(to_cents(99.99).unwrap(), 9999);
        assert_eq!(to_cents(0.125).unwrap(), 13);
        assert_eq!(to_cents(10.0).unwrap(), 1000);
        assert!(to_cents(-1.0).is_err());
        assert!(to_cents(f64::NAN).is_err());
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", Some("  Ann ".into())).unwrap(), "Ann");
        let err = required("name", Some("   ".into())).unwrap_err();
        assert_eq!(err.public_message(), "name is required");
        assert!(required("name", None).is_err());
    }
}
