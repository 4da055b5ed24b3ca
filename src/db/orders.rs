//! `orders` queries.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::models::DbOrder;
use super::patch::OrderCreate;
use crate::error::MeetmindError;

const ORDER_COLUMNS: &str = "id, customer_name, customer_email, product_name, amount, status, \
                             payment_method, notes, created_at, updated_at";

/// Orders newest first, optionally only those created at or after `since`.
pub(super) async fn list(
    pool: &SqlitePool,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<DbOrder>, MeetmindError> {
    let rows = sqlx::query_as::<_, DbOrder>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
        FROM orders
        WHERE ? IS NULL OR created_at >= ?
        ORDER BY created_at DESC
        "#
    ))
    .bind(since)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub(super) async fn get(pool: &SqlitePool, id: &str) -> Result<Option<DbOrder>, MeetmindError> {
    let row = sqlx::query_as::<_, DbOrder>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

async fn insert(
    tx: &mut Transaction<'_, Sqlite>,
    create: OrderCreate,
) -> Result<DbOrder, MeetmindError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, DbOrder>(&format!(
        r#"
        INSERT INTO orders (
            id, customer_name, customer_email, product_name, amount, status,
            payment_method, notes, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(create.customer_name)
    .bind(create.customer_email)
    .bind(create.product_name)
    .bind(create.amount)
    .bind(create.status)
    .bind(create.payment_method)
    .bind(create.notes)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

/// Inserts all orders in one transaction, in the given order.
pub(super) async fn create_many(
    pool: &SqlitePool,
    creates: Vec<OrderCreate>,
) -> Result<Vec<DbOrder>, MeetmindError> {
    let mut tx = pool.begin().await?;
    let mut rows = Vec::with_capacity(creates.len());
    for create in creates {
        rows.push(insert(&mut tx, create).await?);
    }
    tx.commit().await?;
    Ok(rows)
}

pub(super) async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, MeetmindError> {
    let res = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}
