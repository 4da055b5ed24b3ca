//! Polar reconciliation: sync upserts, webhook writes and duplicate cleanup.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::models::{CleanupStats, PaymentStatus, UpsertOutcome};
use super::patch::{PaymentCreate, PolarKey, PolarPaymentUpsert};
use super::payments;
use crate::error::MeetmindError;

/// Updates the payment already linked to this Polar order, or inserts a new one.
pub(super) async fn upsert_polar_payment(
    pool: &SqlitePool,
    up: PolarPaymentUpsert,
) -> Result<UpsertOutcome, MeetmindError> {
    let mut tx = pool.begin().await?;

    let existing: Option<String> = sqlx::query_scalar(
        r#"
        SELECT id FROM payments
        WHERE polar_order_id = ? OR polar_payment_id = ?
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(&up.polar_order_id)
    .bind(&up.polar_order_id)
    .fetch_optional(&mut *tx)
    .await?;

    let outcome = match existing {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE payments
                SET
                    polar_order_id = ?,
                    polar_customer_id = ?,
                    customer_name = ?,
                    customer_email = ?,
                    amount = ?,
                    currency = ?,
                    status = ?,
                    product_name = ?,
                    payment_method = ?,
                    metadata = ?,
                    polar_webhook_data = ?,
                    synced_from_polar = 1,
                    last_sync_at = ?,
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(up.polar_order_id)
            .bind(up.polar_customer_id)
            .bind(up.customer_name)
            .bind(up.customer_email)
            .bind(up.amount)
            .bind(up.currency)
            .bind(up.status)
            .bind(up.product_name)
            .bind(up.payment_method)
            .bind(up.metadata)
            .bind(up.polar_webhook_data)
            .bind(up.synced_at)
            .bind(Utc::now())
            .bind(&id)
            .execute(&mut *tx)
            .await?;
            debug!(payment_id = %id, "polar order matched existing payment");
            UpsertOutcome::Updated
        }
        None => {
            let create = PaymentCreate {
                customer_name: up.customer_name,
                customer_email: up.customer_email,
                amount: up.amount,
                currency: up.currency,
                status: up.status,
                payment_method: Some(up.payment_method),
                product_name: Some(up.product_name),
                metadata: Some(up.metadata),
                polar_order_id: Some(up.polar_order_id),
                polar_payment_id: None,
                polar_customer_id: up.polar_customer_id,
                subscription_id: None,
                polar_webhook_data: Some(up.polar_webhook_data),
                synced_from_polar: true,
            };
            let row = payments::insert(&mut *tx, create).await?;
            debug!(payment_id = %row.id, "polar order inserted");
            UpsertOutcome::Created
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

/// Inserts a pending payment for a webhook event unless one already carries the key.
pub(super) async fn create_from_webhook(
    pool: &SqlitePool,
    key: PolarKey,
    mut create: PaymentCreate,
) -> Result<UpsertOutcome, MeetmindError> {
    let mut tx = pool.begin().await?;

    let existing: Option<String> = sqlx::query_scalar(
        r#"
        SELECT id FROM payments
        WHERE polar_order_id = ? OR polar_payment_id = ? OR subscription_id = ?
        LIMIT 1
        "#,
    )
    .bind(key.id())
    .bind(key.id())
    .bind(key.id())
    .fetch_optional(&mut *tx)
    .await?;

    if existing.is_some() {
        return Ok(UpsertOutcome::Exists);
    }

    match key {
        PolarKey::Order(id) => create.polar_order_id = Some(id),
        PolarKey::Subscription(id) => create.subscription_id = Some(id),
    }
    payments::insert(&mut *tx, create).await?;
    tx.commit().await?;
    Ok(UpsertOutcome::Created)
}

/// Sets the status of every payment linked to a Polar id.
pub(super) async fn set_status_by_polar_id(
    pool: &SqlitePool,
    polar_id: &str,
    status: PaymentStatus,
) -> Result<UpsertOutcome, MeetmindError> {
    let now = Utc::now();
    let processed_at = (status == PaymentStatus::Succeeded).then_some(now);
    let res = sqlx::query(
        r#"
        UPDATE payments
        SET status = ?, processed_at = COALESCE(?, processed_at), updated_at = ?
        WHERE polar_order_id = ? OR polar_payment_id = ? OR subscription_id = ?
        "#,
    )
    .bind(status)
    .bind(processed_at)
    .bind(now)
    .bind(polar_id)
    .bind(polar_id)
    .bind(polar_id)
    .execute(pool)
    .await?;

    Ok(if res.rows_affected() > 0 {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::NotFound
    })
}

/// Deletes all but the oldest payment of every duplicate group, first by
/// `subscription_id`, then by `polar_order_id`, in one transaction.
pub(super) async fn cleanup_duplicates(pool: &SqlitePool) -> Result<CleanupStats, MeetmindError> {
    let mut tx = pool.begin().await?;
    let mut stats = CleanupStats::default();

    for column in ["subscription_id", "polar_order_id"] {
        let groups: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*) FROM (
                SELECT {column} FROM payments
                WHERE {column} IS NOT NULL
                GROUP BY {column}
                HAVING COUNT(*) > 1
            )
            "#
        ))
        .fetch_one(&mut *tx)
        .await?;

        // Ties on created_at fall back to insertion order.
        let deleted: Vec<String> = sqlx::query_scalar(&format!(
            r#"
            DELETE FROM payments
            WHERE id IN (
                SELECT id FROM (
                    SELECT id, ROW_NUMBER() OVER (
                        PARTITION BY {column} ORDER BY created_at ASC, rowid ASC
                    ) AS rn
                    FROM payments
                    WHERE {column} IS NOT NULL
                )
                WHERE rn > 1
            )
            RETURNING id
            "#
        ))
        .fetch_all(&mut *tx)
        .await?;

        for id in &deleted {
            debug!(payment_id = %id, group_by = column, "deleted duplicate payment");
        }
        info!(
            group_by = column,
            groups,
            deleted = deleted.len(),
            "duplicate payment groups cleaned"
        );

        let groups = u64::try_from(groups).unwrap_or_default();
        let deleted = deleted.len() as u64;
        if column == "subscription_id" {
            stats.subscription_groups = groups;
        } else {
            stats.order_groups = groups;
        }
        stats.deleted_count += deleted;
    }

    tx.commit().await?;
    Ok(stats)
}
