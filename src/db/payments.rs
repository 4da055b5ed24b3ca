//! `payments` CRUD and report loaders.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::like_contains;
use super::models::DbPayment;
use super::patch::{PaymentCreate, PaymentFilter, PaymentWindow, SortOrder};
use crate::error::MeetmindError;

pub(super) const PAYMENT_COLUMNS: &str = "id, polar_payment_id, polar_order_id, polar_customer_id, \
     customer_name, customer_email, amount, currency, status, payment_method, payment_intent_id, \
     subscription_id, product_name, metadata, polar_webhook_data, created_at, updated_at, \
     processed_at, synced_from_polar, last_sync_at";

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PaymentFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(term) = filter.search.as_deref() {
        let pattern = like_contains(term);
        qb.push(" AND (customer_name LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR customer_email LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR product_name LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR polar_payment_id LIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

/// One page of payments matching `filter`, plus the number of matching rows.
pub(super) async fn list(
    pool: &SqlitePool,
    filter: PaymentFilter,
) -> Result<(Vec<DbPayment>, i64), MeetmindError> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments"));
    push_filters(&mut qb, &filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);
    let rows = qb.build_query_as::<DbPayment>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM payments");
    push_filters(&mut count_qb, &filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((rows, total))
}

pub(super) async fn get(pool: &SqlitePool, id: &str) -> Result<Option<DbPayment>, MeetmindError> {
    let row = sqlx::query_as::<_, DbPayment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub(super) async fn insert(
    conn: &mut SqliteConnection,
    create: PaymentCreate,
) -> Result<DbPayment, MeetmindError> {
    let now = Utc::now();
    let last_sync_at = create.synced_from_polar.then_some(now);
    let row = sqlx::query_as::<_, DbPayment>(&format!(
        r#"
        INSERT INTO payments (
            id, polar_payment_id, polar_order_id, polar_customer_id, customer_name, customer_email,
            amount, currency, status, payment_method, subscription_id, product_name, metadata,
            polar_webhook_data, created_at, updated_at, synced_from_polar, last_sync_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(create.polar_payment_id)
    .bind(create.polar_order_id)
    .bind(create.polar_customer_id)
    .bind(create.customer_name)
    .bind(create.customer_email)
    .bind(create.amount)
    .bind(create.currency)
    .bind(create.status)
    .bind(create.payment_method)
    .bind(create.subscription_id)
    .bind(create.product_name)
    .bind(create.metadata)
    .bind(create.polar_webhook_data)
    .bind(now)
    .bind(now)
    .bind(create.synced_from_polar)
    .bind(last_sync_at)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

pub(super) async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, MeetmindError> {
    let res = sqlx::query("DELETE FROM payments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Payments inside an optional `created_at` window, for report builders.
pub(super) async fn load(
    pool: &SqlitePool,
    window: PaymentWindow,
) -> Result<Vec<DbPayment>, MeetmindError> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments"));
    if let Some(range) = window.range {
        qb.push(" WHERE created_at >= ")
            .push_bind(range.start)
            .push(" AND created_at <= ")
            .push_bind(range.end);
    }
    qb.push(match window.order {
        SortOrder::NewestFirst => " ORDER BY created_at DESC, rowid DESC",
        SortOrder::OldestFirst => " ORDER BY created_at ASC, rowid ASC",
    });
    if let Some(limit) = window.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
    let rows = qb.build_query_as::<DbPayment>().fetch_all(pool).await?;
    Ok(rows)
}
