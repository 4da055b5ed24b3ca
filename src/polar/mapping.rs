//! Polar order -> `payments` row mapping.

use chrono::{DateTime, Utc};
use meetmind_schema::PolarOrder;
use serde_json::{Value, json};

use crate::db::{PaymentStatus, PolarPaymentUpsert};

pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";
pub const UNKNOWN_EMAIL: &str = "unknown@example.com";
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Maps a Polar order status onto the local payment status. Unknown or missing
/// statuses become `pending`.
pub fn map_order_status(status: Option<&str>) -> PaymentStatus {
    match status.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("paid" | "completed" | "succeeded") => PaymentStatus::Succeeded,
        Some("canceled" | "cancelled") => PaymentStatus::Cancelled,
        Some("processing") => PaymentStatus::Processing,
        Some("failed") => PaymentStatus::Failed,
        Some("refunded") => PaymentStatus::Refunded,
        _ => PaymentStatus::Pending,
    }
}

/// Builds the upsert for one order. `raw` is the order exactly as received and
/// is kept verbatim in `polar_webhook_data`.
pub fn order_to_upsert(order: &PolarOrder, raw: &Value, now: DateTime<Utc>) -> PolarPaymentUpsert {
    let status = map_order_status(order.status.as_deref());
    let metadata = json!({
        "orderId": order.id,
        "productId": order.product_ref(),
        "customerId": order.customer_ref(),
        "status": order.status,
        "type": "order",
    });

    let customer_name = order.customer_name().unwrap_or(UNKNOWN_CUSTOMER);

    PolarPaymentUpsert {
        polar_order_id: order.id.clone(),
        polar_customer_id: order.customer_ref().map(str::to_string),
        customer_name: customer_name.to_string(),
        customer_email: order.customer_email().unwrap_or(UNKNOWN_EMAIL).to_string(),
        amount: order.amount_cents().unwrap_or(0),
        currency: order
            .currency
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| "USD".to_string()),
        status,
        product_name: order.product_name().unwrap_or(UNKNOWN_PRODUCT).to_string(),
        payment_method: "order".to_string(),
        metadata: metadata.to_string(),
        polar_webhook_data: raw.to_string(),
        synced_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_aliases_collapse() {
        assert_eq!(map_order_status(Some("paid")), PaymentStatus::Succeeded);
        assert_eq!(
            map_order_status(Some("Completed")),
            PaymentStatus::Succeeded
        );
        assert_eq!(map_order_status(Some("canceled")), PaymentStatus::Cancelled);
        assert_eq!(map_order_status(Some("refunded")), PaymentStatus::Refunded);
        assert_eq!(map_order_status(Some("on_hold")), PaymentStatus::Pending);
        assert_eq!(map_order_status(None), PaymentStatus::Pending);
    }

    #[test]
    fn falls_back_through_customer_sources() {
        let raw = json!({
            "id": "ord_1",
            "status": "paid",
            "total_amount": 2500,
            "user": { "email": "ada@example.com" },
            "product_id": "prod_9"
        });
        let order: PolarOrder = serde_json::from_value(raw.clone()).expect("order");
        let up = order_to_upsert(&order, &raw, Utc::now());

        assert_eq!(up.customer_name, "ada@example.com");
        assert_eq!(up.customer_email, "ada@example.com");
        assert_eq!(up.amount, 2500);
        assert_eq!(up.currency, "USD");
        assert_eq!(up.status, PaymentStatus::Succeeded);
        assert_eq!(up.product_name, UNKNOWN_PRODUCT);

        let metadata: Value = serde_json::from_str(&up.metadata).expect("metadata json");
        assert_eq!(metadata["productId"], "prod_9");
        assert_eq!(metadata["type"], "order");
        assert_eq!(up.polar_webhook_data, raw.to_string());
    }

    #[test]
    fn empty_order_gets_placeholders() {
        let raw = json!({ "id": "ord_2" });
        let order: PolarOrder = serde_json::from_value(raw.clone()).expect("order");
        let up = order_to_upsert(&order, &raw, Utc::now());

        assert_eq!(up.customer_name, UNKNOWN_CUSTOMER);
        assert_eq!(up.customer_email, UNKNOWN_EMAIL);
        assert_eq!(up.amount, 0);
        assert_eq!(up.status, PaymentStatus::Pending);
    }
}
