//! `/api/admin/orders`: amounts cross the API in dollars and are stored in cents.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use super::{attachment, json_body, required, to_cents};
use crate::db::{DbOrder, EntityPatch, OrderCreate, OrderPatch, OrderStatus};
use crate::error::MeetmindError;
use crate::reports::export::orders_csv;
use crate::reports::orders::{OrderRange, dashboard, dollars};
use crate::reports::{ReportFormat, timestamp};
use crate::server::router::AppState;

const DEFAULT_PAYMENT_METHOD: &str = "cash";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/orders", get(list_orders).post(create_order))
        .route("/api/admin/orders/report", get(orders_report))
        .route(
            "/api/admin/orders/{id}",
            patch(update_order).delete(delete_order),
        )
        .route("/api/admin/seed", post(seed_orders))
}

/// Order as the admin dashboard reads it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub product_name: String,
    pub amount: f64,
    pub status: OrderStatus,
    pub payment_method: String,
    pub order_date: String,
    pub updated_at: String,
    pub notes: String,
}

impl From<DbOrder> for OrderView {
    fn from(o: DbOrder) -> Self {
        Self {
            amount: dollars(o.amount),
            payment_method: o
                .payment_method
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            order_date: timestamp(o.created_at),
            updated_at: timestamp(o.updated_at),
            notes: o.notes.unwrap_or_default(),
            id: o.id,
            customer_name: o.customer_name,
            customer_email: o.customer_email,
            product_name: o.product_name,
            status: o.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderInput {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub product_name: Option<String>,
    /// Dollars.
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

fn parse_status(raw: Option<String>) -> Result<Option<OrderStatus>, MeetmindError> {
    raw.map(|s| s.trim().parse::<OrderStatus>())
        .transpose()
        .map_err(MeetmindError::BadRequest)
}

impl OrderInput {
    fn into_create(self) -> Result<OrderCreate, MeetmindError> {
        let amount = self
            .amount
            .ok_or_else(|| MeetmindError::bad_request("amount is required"))?;
        Ok(OrderCreate {
            customer_name: required("customer_name", self.customer_name)?,
            customer_email: required("customer_email", self.customer_email)?,
            product_name: required("product_name", self.product_name)?,
            amount: to_cents(amount)?,
            status: parse_status(self.status)?.unwrap_or(OrderStatus::Pending),
            payment_method: Some(
                self.payment_method
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            ),
            notes: Some(self.notes.unwrap_or_default()),
        })
    }

    fn into_patch(self) -> Result<OrderPatch, MeetmindError> {
        Ok(OrderPatch {
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            product_name: self.product_name,
            amount: self.amount.map(to_cents).transpose()?,
            status: parse_status(self.status)?,
            payment_method: self.payment_method,
            notes: self.notes,
        })
    }
}

/// GET /api/admin/orders
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderView>>, MeetmindError> {
    let orders = state.db.list_orders(None).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// POST /api/admin/orders
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> Result<Json<DbOrder>, MeetmindError> {
    let create = json_body(payload)?.into_create()?;
    let mut rows = state.db.create_orders(vec![create]).await?;
    let order = rows
        .pop()
        .ok_or_else(|| MeetmindError::UnexpectedError("order insert returned no row".into()))?;
    info!(order_id = %order.id, amount = order.amount, "order created");
    Ok(Json(order))
}

/// PATCH /api/admin/orders/{id}
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> Result<Json<Value>, MeetmindError> {
    let patch = json_body(payload)?.into_patch()?;
    let affected = state
        .db
        .patch(EntityPatch::Order {
            id: id.clone(),
            patch,
        })
        .await?;
    if affected == 0 {
        return Err(MeetmindError::NotFound("Order not found"));
    }
    let order = state
        .db
        .get_order(id)
        .await?
        .ok_or(MeetmindError::NotFound("Order not found"))?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// DELETE /api/admin/orders/{id}
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, MeetmindError> {
    if !state.db.delete_order(id).await? {
        return Err(MeetmindError::NotFound("Order not found"));
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct OrdersReportQuery {
    pub range: Option<String>,
    pub format: Option<String>,
}

/// GET /api/admin/orders/report?range=&format=
pub async fn orders_report(
    State(state): State<AppState>,
    Query(query): Query<OrdersReportQuery>,
) -> Result<Response, MeetmindError> {
    let range = query
        .range
        .as_deref()
        .unwrap_or("30d")
        .parse::<OrderRange>()?;
    let format = query
        .format
        .as_deref()
        .unwrap_or("json")
        .parse::<ReportFormat>()?;

    let now = Utc::now();
    let orders = state.db.list_orders(range.cutoff(now)).await?;

    match format {
        ReportFormat::Json => Ok(Json(dashboard(range, &orders)).into_response()),
        ReportFormat::Csv => {
            let bytes = orders_csv(&orders)?;
            Ok(attachment(
                "text/csv; charset=utf-8",
                &format!("orders-{}.csv", now.format("%Y-%m-%d")),
                bytes,
            ))
        }
        ReportFormat::Pdf => Err(MeetmindError::bad_request(
            "Invalid format. Use: json or csv",
        )),
    }
}

struct DemoOrder {
    customer_name: &'static str,
    customer_email: &'static str,
    product_name: &'static str,
    amount: i64,
    status: OrderStatus,
    payment_method: &'static str,
    notes: &'static str,
}

const DEMO_ORDERS: [DemoOrder; 8] = [
    DemoOrder {
        customer_name: "John Smith",
        customer_email: "john@example.com",
        product_name: "Premium Meeting Package",
        amount: 9999,
        status: OrderStatus::Completed,
        payment_method: "credit_card",
        notes: "VIP customer - priority support",
    },
    DemoOrder {
        customer_name: "Sarah Johnson",
        customer_email: "sarah@company.com",
        product_name: "Basic AI Agent",
        amount: 2999,
        status: OrderStatus::Pending,
        payment_method: "paypal",
        notes: "Corporate account - billing monthly",
    },
    DemoOrder {
        customer_name: "Mike Davis",
        customer_email: "mike.davis@startup.io",
        product_name: "Enterprise Solution",
        amount: 49999,
        status: OrderStatus::Completed,
        payment_method: "bank_transfer",
        notes: "Annual subscription - includes premium features",
    },
    DemoOrder {
        customer_name: "Lisa Chen",
        customer_email: "lisa.chen@tech.com",
        product_name: "Standard Package",
        amount: 4999,
        status: OrderStatus::Cancelled,
        payment_method: "credit_card",
        notes: "Cancelled due to budget constraints",
    },
    DemoOrder {
        customer_name: "Robert Wilson",
        customer_email: "r.wilson@business.net",
        product_name: "Pro Meeting Tools",
        amount: 7999,
        status: OrderStatus::Completed,
        payment_method: "stripe",
        notes: "Upgraded from basic plan",
    },
    DemoOrder {
        customer_name: "Emily Brown",
        customer_email: "emily@freelance.com",
        product_name: "Starter Package",
        amount: 1999,
        status: OrderStatus::Pending,
        payment_method: "credit_card",
        notes: "First-time customer",
    },
    DemoOrder {
        customer_name: "David Kim",
        customer_email: "david.kim@agency.co",
        product_name: "Agency Bundle",
        amount: 19999,
        status: OrderStatus::Completed,
        payment_method: "bank_transfer",
        notes: "Multi-user license for team",
    },
    DemoOrder {
        customer_name: "Rachel Green",
        customer_email: "rachel@consulting.biz",
        product_name: "Professional Package",
        amount: 12999,
        status: OrderStatus::Completed,
        payment_method: "paypal",
        notes: "Monthly recurring subscription",
    },
];

fn demo_orders() -> Vec<OrderCreate> {
    DEMO_ORDERS
        .iter()
        .map(|d| OrderCreate {
            customer_name: d.customer_name.to_string(),
            customer_email: d.customer_email.to_string(),
            product_name: d.product_name.to_string(),
            amount: d.amount,
            status: d.status,
            payment_method: Some(d.payment_method.to_string()),
            notes: Some(d.notes.to_string()),
        })
        .collect()
}

/// POST /api/admin/seed
pub async fn seed_orders(State(state): State<AppState>) -> Result<Json<Value>, MeetmindError> {
    let orders = state.db.create_orders(demo_orders()).await?;
    info!(count = orders.len(), "seeded demo orders");
    Ok(Json(json!({
        "success": true,
        "message": format!("Successfully seeded {} orders", orders.len()),
        "orders": orders,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn parse_ts(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("rfc3339 timestamp")
            .with_timezone(&Utc)
    }

    fn input(amount: Option<f64>, status: Option<&str>) -> OrderInput {
        OrderInput {
            customer_name: Some("Ann".into()),
            customer_email: Some("ann@x.io".into()),
            product_name: Some("Plan".into()),
            amount,
            status: status.map(str::to_string),
            payment_method: None,
            notes: None,
        }
    }

    #[test]
    fn create_applies_defaults() {
        let create = input(Some(19.99), None).into_create().unwrap();
        assert_eq!(create.amount, 1999);
        assert_eq!(create.status, OrderStatus::Pending);
        assert_eq!(create.payment_method.as_deref(), Some("cash"));
        assert_eq!(create.notes.as_deref(), Some(""));
    }

    #[test]
    fn create_rejects_bad_input() {
        assert!(input(None, None).into_create().is_err());
        assert!(input(Some(-5.0), None).into_create().is_err());
        assert!(input(Some(5.0), Some("shipped")).into_create().is_err());
    }

    #[test]
    fn view_converts_cents_and_fills_defaults() {
        let at = parse_ts("2024-05-01T08:00:00Z");
        let view = OrderView::from(DbOrder {
            id: "o1".into(),
            customer_name: "Ann".into(),
            customer_email: "ann@x.io".into(),
            product_name: "Plan".into(),
            amount: 2999,
            status: OrderStatus::Completed,
            payment_method: None,
            notes: None,
            created_at: at,
            updated_at: at,
        });
        assert_eq!(view.amount, 29.99);
        assert_eq!(view.payment_method, "cash");
        assert_eq!(view.notes, "");
        assert_eq!(view.order_date, "2024-05-01T08:00:00.000Z");
    }

    #[test]
    fn demo_set_has_eight_orders() {
        let orders = demo_orders();
        assert_eq!(orders.len(), 8);
        assert_eq!(orders.iter().map(|o| o.amount).sum::<i64>(), 110_992);
    }
}
