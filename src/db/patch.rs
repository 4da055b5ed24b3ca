//! Create and patch payloads accepted by the `DbActor`.
//!
//! Amounts are already converted to cents here; the HTTP layer owns the
//! dollars-to-cents conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{OrderStatus, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    /// `None` => do not change; `Some(v)` => update
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreate {
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCreate {
    pub user_id: String,
    pub name: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingCreate {
    pub user_id: String,
    pub agent_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_name: String,
    pub customer_email: String,
    pub product_name: String,
    pub amount: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    /// `None` => do not change; `Some(v)` => update
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub product_name: Option<String>,
    pub amount: Option<i64>,
    pub status: Option<OrderStatus>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub customer_name: String,
    pub customer_email: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub product_name: Option<String>,
    pub metadata: Option<String>,
    pub polar_order_id: Option<String>,
    pub polar_payment_id: Option<String>,
    pub polar_customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub polar_webhook_data: Option<String>,
    pub synced_from_polar: bool,
}

impl PaymentCreate {
    /// A manually entered payment with no Polar linkage.
    pub fn manual(customer_name: String, customer_email: String, amount: i64) -> Self {
        Self {
            customer_name,
            customer_email,
            amount,
            currency: "USD".to_string(),
            status: PaymentStatus::Pending,
            payment_method: Some("manual".to_string()),
            product_name: None,
            metadata: None,
            polar_order_id: None,
            polar_payment_id: None,
            polar_customer_id: None,
            subscription_id: None,
            polar_webhook_data: None,
            synced_from_polar: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentPatch {
    /// `None` => do not change; `Some(v)` => update
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub product_name: Option<String>,
    pub metadata: Option<String>,
}

/// A Polar order mapped onto payment columns, upserted by `polar_order_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolarPaymentUpsert {
    pub polar_order_id: String,
    pub polar_customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub product_name: String,
    pub payment_method: String,
    pub metadata: String,
    pub polar_webhook_data: String,
    pub synced_at: DateTime<Utc>,
}

/// Which Polar identifier a webhook-created payment is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolarKey {
    Order(String),
    Subscription(String),
}

impl PolarKey {
    pub fn id(&self) -> &str {
        match self {
            PolarKey::Order(id) | PolarKey::Subscription(id) => id,
        }
    }
}

/// Filters for `GET /api/payments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub search: Option<String>,
    pub status: Option<PaymentStatus>,
    pub limit: i64,
    pub offset: i64,
}

/// Inclusive `created_at` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

/// Row selection for report loaders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaymentWindow {
    pub range: Option<DateRange>,
    pub order: SortOrder,
    pub limit: Option<i64>,
}

/// Patch envelope: which row, and what to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum EntityPatch {
    User { id: String, patch: UserPatch },
    Order { id: String, patch: OrderPatch },
    Payment { id: String, patch: PaymentPatch },
}
