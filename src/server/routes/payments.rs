//! `/api/payments`: manual payment CRUD plus the Polar sync, cleanup and debug endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};

use super::{json_body, required, to_cents};
use crate::db::{DbPayment, EntityPatch, PaymentCreate, PaymentFilter, PaymentPatch, PaymentStatus};
use crate::error::MeetmindError;
use crate::polar::sync_orders;
use crate::reports::timestamp;
use crate::server::router::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments", get(list_payments).post(create_payment))
        .route("/api/payments/sync", post(sync_payments))
        .route("/api/payments/cleanup", post(cleanup_payments))
        .route("/api/payments/debug", get(debug_polar))
        .route(
            "/api/payments/{id}",
            get(get_payment)
                .patch(update_payment)
                .delete(delete_payment),
        )
}

#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaymentQuery {
    fn into_filter(self) -> Result<PaymentFilter, MeetmindError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(s) => Some(s.parse::<PaymentStatus>().map_err(MeetmindError::BadRequest)?),
        };
        Ok(PaymentFilter {
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            status,
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: self.offset.unwrap_or(0).max(0),
        })
    }
}

/// GET /api/payments?search=&status=&limit=&offset=
pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Value>, MeetmindError> {
    let filter = query.into_filter()?;
    let (limit, offset) = (filter.limit, filter.offset);
    let (payments, total) = state.db.list_payments(filter).await?;
    Ok(Json(json!({
        "payments": payments,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    /// Dollars.
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub product_name: Option<String>,
    pub metadata: Option<Value>,
}

fn parse_status(raw: Option<String>) -> Result<Option<PaymentStatus>, MeetmindError> {
    raw.map(|s| s.trim().parse::<PaymentStatus>())
        .transpose()
        .map_err(MeetmindError::BadRequest)
}

/// Metadata is kept as JSON text; `null` counts as absent.
fn metadata_text(metadata: Option<Value>) -> Result<Option<String>, MeetmindError> {
    metadata
        .filter(|v| !v.is_null())
        .map(|v| serde_json::to_string(&v))
        .transpose()
        .map_err(MeetmindError::from)
}

fn currency(raw: Option<String>) -> Option<String> {
    raw.map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
}

impl PaymentInput {
    fn into_create(self) -> Result<PaymentCreate, MeetmindError> {
        let amount = self
            .amount
            .ok_or_else(|| MeetmindError::bad_request("amount is required"))?;
        let mut create = PaymentCreate::manual(
            required("customerName", self.customer_name)?,
            required("customerEmail", self.customer_email)?,
            to_cents(amount)?,
        );
        if let Some(currency) = currency(self.currency) {
            create.currency = currency;
        }
        if let Some(status) = parse_status(self.status)? {
            create.status = status;
        }
        if let Some(method) = self.payment_method.filter(|m| !m.trim().is_empty()) {
            create.payment_method = Some(method);
        }
        create.product_name = self.product_name;
        create.metadata = metadata_text(self.metadata)?;
        Ok(create)
    }

    fn into_patch(self) -> Result<PaymentPatch, MeetmindError> {
        Ok(PaymentPatch {
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            amount: self.amount.map(to_cents).transpose()?,
            currency: currency(self.currency),
            status: parse_status(self.status)?,
            payment_method: self.payment_method,
            product_name: self.product_name,
            metadata: metadata_text(self.metadata)?,
        })
    }
}

/// POST /api/payments
pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<PaymentInput>, JsonRejection>,
) -> Result<Json<DbPayment>, MeetmindError> {
    let create = json_body(payload)?.into_create()?;
    let payment = state.db.create_payment(create).await?;
    info!(payment_id = %payment.id, amount = payment.amount, "manual payment created");
    Ok(Json(payment))
}

/// GET /api/payments/{id}
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DbPayment>, MeetmindError> {
    state
        .db
        .get_payment(id)
        .await?
        .map(Json)
        .ok_or(MeetmindError::NotFound("Payment not found"))
}

/// PATCH /api/payments/{id}
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PaymentInput>, JsonRejection>,
) -> Result<Json<Value>, MeetmindError> {
    let patch = json_body(payload)?.into_patch()?;
    let affected = state
        .db
        .patch(EntityPatch::Payment {
            id: id.clone(),
            patch,
        })
        .await?;
    if affected == 0 {
        return Err(MeetmindError::NotFound("Payment not found"));
    }
    let payment = state
        .db
        .get_payment(id)
        .await?
        .ok_or(MeetmindError::NotFound("Payment not found"))?;
    Ok(Json(json!({ "success": true, "payment": payment })))
}

/// DELETE /api/payments/{id}
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, MeetmindError> {
    if !state.db.delete_payment(id.clone()).await? {
        return Err(MeetmindError::NotFound("Payment not found"));
    }
    info!(payment_id = %id, "payment deleted");
    Ok(Json(json!({ "success": true })))
}

/// POST /api/payments/sync
pub async fn sync_payments(State(state): State<AppState>) -> Response {
    match sync_orders(&state.polar, &state.db).await {
        Ok(report) => Json(json!({
            "success": true,
            "message": report.message(),
            "stats": report.stats,
            "debug": report.debug,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "Polar orders sync failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Orders sync failed",
                    "message": e.public_message(),
                    "timestamp": timestamp(Utc::now()),
                })),
            )
                .into_response()
        }
    }
}

/// POST /api/payments/cleanup
pub async fn cleanup_payments(State(state): State<AppState>) -> Response {
    match state.db.cleanup_duplicates().await {
        Ok(stats) => {
            info!(
                deleted = stats.deleted_count,
                subscription_groups = stats.subscription_groups,
                order_groups = stats.order_groups,
                "duplicate payments cleaned up"
            );
            Json(json!({
                "success": true,
                "message": format!("Cleanup complete! Deleted {} duplicates", stats.deleted_count),
                "stats": {
                    "deletedCount": stats.deleted_count,
                    "subscriptionGroups": stats.subscription_groups,
                    "orderGroups": stats.order_groups,
                    "timestamp": timestamp(Utc::now()),
                },
            }))
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "duplicate cleanup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Cleanup failed",
                    "message": e.public_message(),
                })),
            )
                .into_response()
        }
    }
}

/// GET /api/payments/debug
///
/// Shows what the configured token can see; the token itself is never echoed.
pub async fn debug_polar(State(state): State<AppState>) -> Result<Response, MeetmindError> {
    if !state.polar.has_token() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No Polar token configured" })),
        )
            .into_response());
    }
    let (status, data) = state.polar.organizations().await?;
    info!(status = status.as_u16(), "Polar connection checked");
    Ok(Json(json!({
        "success": status.is_success(),
        "status": status.as_u16(),
        "data": data,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(status: Option<&str>, limit: Option<i64>) -> PaymentQuery {
        PaymentQuery {
            search: Some("  ".into()),
            status: status.map(str::to_string),
            limit,
            offset: Some(-3),
        }
    }

    #[test]
    fn filter_normalizes_query() {
        let f = query(Some("all"), Some(10_000)).into_filter().unwrap();
        assert_eq!(f.status, None);
        assert_eq!(f.search, None);
        assert_eq!(f.limit, MAX_LIMIT);
        assert_eq!(f.offset, 0);

        let f = query(Some("refunded"), Some(0)).into_filter().unwrap();
        assert_eq!(f.status, Some(PaymentStatus::Refunded));
        assert_eq!(f.limit, 1);

        assert!(query(Some("paid"), None).into_filter().is_err());
    }

    #[test]
    fn create_defaults_to_manual_pending_usd() {
        let input = PaymentInput {
            customer_name: Some("Ann".into()),
            customer_email: Some("ann@x.io".into()),
            amount: Some(49.99),
            currency: None,
            status: None,
            payment_method: None,
            product_name: Some("Pro".into()),
            metadata: Some(json!({ "note": "wire" })),
        };
        let create = input.into_create().unwrap();
        assert_eq!(create.amount, 4999);
        assert_eq!(create.currency, "USD");
        assert_eq!(create.status, PaymentStatus::Pending);
        assert_eq!(create.payment_method.as_deref(), Some("manual"));
        assert_eq!(create.metadata.as_deref(), Some(r#"{"note":"wire"}"#));
        assert!(!create.synced_from_polar);
    }
}
