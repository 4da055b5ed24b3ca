//! Polar webhook signature check and event dispatch.

use hmac::{Hmac, Mac};
use meetmind_schema::{PolarOrder, PolarWebhookEvent};
use serde::Serialize;
use serde_json::json;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::mapping::{UNKNOWN_CUSTOMER, UNKNOWN_EMAIL};
use crate::db::{DbActorHandle, PaymentCreate, PaymentStatus, PolarKey, UpsertOutcome};
use crate::error::MeetmindError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-polar-signature";

/// Lowercase hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` (optionally `sha256=`-prefixed hex) against the body.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let provided = signature.trim();
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
    let expected = sign(secret, body);
    provided
        .to_ascii_lowercase()
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .into()
}

/// Outcome reported back to Polar under `result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl WebhookOutcome {
    fn new(status: &'static str, action: &'static str) -> Self {
        Self {
            status,
            action: Some(action),
            reason: None,
        }
    }

    fn ignored() -> Self {
        Self {
            status: "ignored",
            action: None,
            reason: Some("unsupported_event_type"),
        }
    }
}

fn data_id(event: &PolarWebhookEvent) -> Result<String, MeetmindError> {
    event
        .data
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| MeetmindError::bad_request("Webhook event data has no id"))
}

async fn handle_created(
    db: &DbActorHandle,
    event: &PolarWebhookEvent,
    key: PolarKey,
) -> Result<WebhookOutcome, MeetmindError> {
    let data: PolarOrder = serde_json::from_value(event.data.clone())?;
    let kind = match key {
        PolarKey::Order(_) => "order",
        PolarKey::Subscription(_) => "subscription",
    };
    let customer_name = data.customer_name().unwrap_or(UNKNOWN_CUSTOMER);
    let create = PaymentCreate {
        customer_name: customer_name.to_string(),
        customer_email: data.customer_email().unwrap_or(UNKNOWN_EMAIL).to_string(),
        amount: data.amount_cents().unwrap_or(0),
        currency: data
            .currency
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| "USD".to_string()),
        status: PaymentStatus::Pending,
        payment_method: Some(kind.to_string()),
        product_name: data.product_name().map(str::to_string),
        metadata: Some(
            json!({
                "eventId": event.id,
                "eventType": event.event_type,
                "productId": data.product_ref(),
                "type": kind,
            })
            .to_string(),
        ),
        polar_order_id: None,
        polar_payment_id: None,
        polar_customer_id: data.customer_ref().map(str::to_string),
        subscription_id: data.subscription_id.clone(),
        polar_webhook_data: Some(event.data.to_string()),
        synced_from_polar: true,
    };

    Ok(match db.create_from_webhook(key, create).await? {
        UpsertOutcome::Created => WebhookOutcome::new("created", "payment_record_created"),
        _ => WebhookOutcome::new("exists", "no_action_required"),
    })
}

async fn handle_status(
    db: &DbActorHandle,
    event: &PolarWebhookEvent,
    status: PaymentStatus,
    action: &'static str,
) -> Result<WebhookOutcome, MeetmindError> {
    let id = data_id(event)?;
    Ok(match db.set_status_by_polar_id(id, status).await? {
        UpsertOutcome::NotFound => WebhookOutcome::new("not_found", "payment_record_not_found"),
        _ => WebhookOutcome::new("updated", action),
    })
}

/// Applies one verified event to the payments table.
pub async fn dispatch(
    db: &DbActorHandle,
    event: &PolarWebhookEvent,
) -> Result<WebhookOutcome, MeetmindError> {
    info!(
        event_id = event.id.as_deref().unwrap_or("-"),
        event_type = %event.event_type,
        data_keys = ?event.data_keys(),
        "Processing Polar webhook event"
    );

    match event.event_type.as_str() {
        "order.created" => handle_created(db, event, PolarKey::Order(data_id(event)?)).await,
        "subscription.created" => {
            handle_created(db, event, PolarKey::Subscription(data_id(event)?)).await
        }
        "order.paid" | "subscription.updated" => {
            handle_status(
                db,
                event,
                PaymentStatus::Succeeded,
                "payment_status_updated_to_succeeded",
            )
            .await
        }
        "subscription.canceled" | "subscription.cancelled" => {
            handle_status(
                db,
                event,
                PaymentStatus::Cancelled,
                "payment_status_updated_to_cancelled",
            )
            .await
        }
        "order.refunded" => {
            handle_status(
                db,
                event,
                PaymentStatus::Refunded,
                "payment_status_updated_to_refunded",
            )
            .await
        }
        other => {
            warn!(event_type = other, "Unhandled Polar webhook event type");
            Ok(WebhookOutcome::ignored())
        }
    }
}
