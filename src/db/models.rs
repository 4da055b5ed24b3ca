use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[derive(Serialize, Deserialize, sqlx::Type)]
        #[serde(rename_all = "lowercase")]
        #[sqlx(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "invalid {} '{}' (expected one of: {})",
                        stringify!($name),
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

text_enum!(
    /// Lifecycle label of an admin order.
    OrderStatus {
        Pending => "pending",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

text_enum!(
    /// Lifecycle label of a payment.
    PaymentStatus {
        Pending => "pending",
        Processing => "processing",
        Succeeded => "succeeded",
        Failed => "failed",
        Cancelled => "cancelled",
        Refunded => "refunded",
    }
);

text_enum!(
    /// `meeting_status`; a plain label, no transitions are enforced.
    MeetingStatus {
        Upcoming => "upcoming",
        Active => "active",
        Completed => "completed",
        Cancelled => "cancelled",
        Processing => "processing",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserStats {
    pub total: i64,
    pub verified: i64,
    pub unverified: i64,
}

/// A live session joined with its user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct SessionUser {
    pub session_id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbAgent {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbAgentWithMeetings {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub agent: DbAgent,
    pub meeting_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbMeeting {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub agent_id: String,
    pub status: MeetingStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub transcript_url: Option<String>,
    pub recording_url: Option<String>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Meeting joined with its agent and owner, as listed and reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbMeetingDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meeting: DbMeeting,
    pub agent_name: String,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbOrder {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub product_name: String,
    /// Cents.
    pub amount: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbPayment {
    pub id: String,
    pub polar_payment_id: Option<String>,
    pub polar_order_id: Option<String>,
    pub polar_customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    /// Cents.
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub subscription_id: Option<String>,
    pub product_name: Option<String>,
    pub metadata: Option<String>,
    pub polar_webhook_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub synced_from_polar: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Result of inserting-or-updating a row keyed by an external id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
    Exists,
    NotFound,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub deleted_count: u64,
    pub subscription_groups: u64,
    pub order_groups: u64,
}

/// `GROUP BY status, currency` row.
#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct StatusCurrencyTotal {
    pub status: PaymentStatus,
    pub currency: String,
    pub count: i64,
    pub total: i64,
}

/// `GROUP BY date` row.
#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DailyRevenue {
    pub date: String,
    pub revenue: i64,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct StatusShare {
    pub status: PaymentStatus,
    pub count: i64,
    pub percentage: f64,
}
