use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of `GET /v1/orders`.
///
/// Items stay as raw JSON so that a single malformed order does not fail the page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PolarOrderList {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub pagination: Option<PolarPagination>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PolarPagination {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub max_page: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PolarCustomer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PolarUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PolarProduct {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A Polar order (also the shape of most webhook `data` payloads).
///
/// Unknown fields are preserved in `extra` so the order can be re-serialized
/// without losing anything.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PolarOrder {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    #[serde(default, alias = "totalAmount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, alias = "customerId", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(default, alias = "productId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    #[serde(default, alias = "subscriptionId", skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<PolarCustomer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PolarUser>,

    #[serde(default, alias = "userEmail", skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<PolarProduct>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PolarOrder {
    /// Amount in cents: `amount`, then `total_amount`, then `total`.
    pub fn amount_cents(&self) -> Option<i64> {
        self.amount.or(self.total_amount).or(self.total)
    }

    /// Customer id, falling back to the embedded customer object.
    pub fn customer_ref(&self) -> Option<&str> {
        self.customer_id
            .as_deref()
            .or_else(|| self.customer.as_ref().and_then(|c| c.id.as_deref()))
    }

    pub fn customer_name(&self) -> Option<&str> {
        let customer = self.customer.as_ref();
        let user = self.user.as_ref();
        [
            customer.and_then(|c| c.name.as_deref()),
            user.and_then(|u| u.name.as_deref()),
            user.and_then(|u| u.email.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
    }

    pub fn customer_email(&self) -> Option<&str> {
        [
            self.customer.as_ref().and_then(|c| c.email.as_deref()),
            self.user.as_ref().and_then(|u| u.email.as_deref()),
            self.user_email.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn product_ref(&self) -> Option<&str> {
        self.product_id
            .as_deref()
            .or_else(|| self.product.as_ref().and_then(|p| p.id.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_current_order_shape() {
        let raw = r#"{
            "id": "ord_1",
            "status": "paid",
            "total_amount": 4999,
            "currency": "usd",
            "customer_id": "cus_1",
            "customer": {"id": "cus_1", "name": "Ada", "email": "ada@example.com"},
            "product": {"id": "prod_1", "name": "Pro"},
            "created_at": "2025-03-01T10:00:00Z",
            "discount_amount": 0
        }"#;
        let order: PolarOrder = serde_json::from_str(raw).expect("parse order");

        assert_eq!(order.amount_cents(), Some(4999));
        assert_eq!(order.customer_name(), Some("Ada"));
        assert_eq!(order.customer_email(), Some("ada@example.com"));
        assert_eq!(order.product_name(), Some("Pro"));
        assert_eq!(order.product_ref(), Some("prod_1"));
        assert_eq!(order.extra.get("discount_amount"), Some(&Value::from(0)));
    }

    #[test]
    fn falls_back_to_user_fields_and_camel_case_aliases() {
        let raw = r#"{
            "id": "ord_2",
            "amount": 1000,
            "total": 2000,
            "customerId": "cus_2",
            "user": {"email": "bob@example.com"}
        }"#;
        let order: PolarOrder = serde_json::from_str(raw).expect("parse order");

        assert_eq!(order.amount_cents(), Some(1000));
        assert_eq!(order.customer_ref(), Some("cus_2"));
        assert_eq!(order.customer_name(), Some("bob@example.com"));
        assert_eq!(order.customer_email(), Some("bob@example.com"));
        assert_eq!(order.product_name(), None);
    }

    #[test]
    fn blank_customer_fields_fall_through_to_the_next_source() {
        let raw = r#"{
            "id": "ord_4",
            "customer": {"name": " ", "email": ""},
            "user": {"name": "", "email": "eve@example.com"},
            "user_email": "stale@example.com"
        }"#;
        let order: PolarOrder = serde_json::from_str(raw).expect("parse order");

        assert_eq!(order.customer_email(), Some("eve@example.com"));
        assert_eq!(order.customer_name(), Some("eve@example.com"));

        let raw = r#"{
            "id": "ord_5",
            "customer": {"email": "  "},
            "user_email": "last@example.com"
        }"#;
        let order: PolarOrder = serde_json::from_str(raw).expect("parse order");
        assert_eq!(order.customer_email(), Some("last@example.com"));
        assert_eq!(order.customer_name(), None);
    }

    #[test]
    fn reserializing_keeps_unknown_fields() {
        let raw = r#"{"id":"ord_3","billing_reason":"purchase"}"#;
        let order: PolarOrder = serde_json::from_str(raw).expect("parse order");
        let value = serde_json::to_value(&order).expect("serialize order");

        assert_eq!(value["billing_reason"], "purchase");
        assert_eq!(value["id"], "ord_3");
    }
}
