use axum::{Json, Router, body::Bytes, extract::State, http::HeaderMap, routing::post};
use chrono::Utc;
use meetmind_schema::PolarWebhookEvent;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::WebhookError;
use crate::polar::{SIGNATURE_HEADER, dispatch, verify_signature};
use crate::reports::timestamp;
use crate::server::router::AppState;
use crate::utils::logging::with_pretty_json_debug;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/polar/webhook", post(polar_webhook))
}

/// POST /api/polar/webhook
///
/// The raw body is verified before it is parsed.
pub async fn polar_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, WebhookError> {
    let started = Instant::now();

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match (state.webhook_secret.as_deref(), signature) {
        (Some(secret), Some(sig)) if verify_signature(secret, &body, sig) => {}
        // A configured secret makes the header mandatory.
        (Some(_), sig) => {
            let signature_present = sig.is_some();
            warn!(signature_present, "Rejected Polar webhook signature");
            return Err(WebhookError::InvalidSignature);
        }
        (None, _) => {
            warn!("POLAR_WEBHOOK_SECRET not configured; accepting unsigned webhook");
        }
    }

    let event: PolarWebhookEvent = serde_json::from_slice(&body)?;
    with_pretty_json_debug(&event, |pretty| {
        debug!(event_type = %event.event_type, "Polar webhook payload:\n{pretty}");
    });

    let result = dispatch(&state.db, &event).await?;
    let processing_time_ms = started.elapsed().as_millis() as u64;
    info!(
        event_type = %event.event_type,
        status = result.status,
        processing_time_ms,
        "Polar webhook processed"
    );

    Ok(Json(json!({
        "received": true,
        "event_type": event.event_type,
        "event_id": event.id,
        "processing_time_ms": processing_time_ms,
        "timestamp": timestamp(Utc::now()),
        "result": result,
    })))
}
