//! EntityPatch -> DbPatchable implementation.
//!
//! This sits in the `db` module because it contains SQL/table knowledge.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::patch::{EntityPatch, OrderPatch, PaymentPatch, UserPatch};
use crate::error::MeetmindError;

/// Applies a patch payload/envelope to the database.
///
/// `None` fields are left untouched through `COALESCE(?, column)`; `updated_at` is
/// always bumped. Returns the number of rows affected (0 when the id is unknown).
pub(crate) trait DbPatchable {
    async fn apply_patch(&self, pool: &SqlitePool) -> Result<u64, MeetmindError>;
}

impl DbPatchable for EntityPatch {
    async fn apply_patch(&self, pool: &SqlitePool) -> Result<u64, MeetmindError> {
        let updated_at = Utc::now();
        match self {
            EntityPatch::User { id, patch } => {
                let UserPatch {
                    name,
                    email,
                    email_verified,
                    image,
                } = patch;

                let res = sqlx::query(
                    r#"
                    UPDATE "user"
                    SET
                        name = COALESCE(?, name),
                        email = COALESCE(?, email),
                        email_verified = COALESCE(?, email_verified),
                        image = COALESCE(?, image),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(name)
                .bind(email)
                .bind(email_verified)
                .bind(image)
                .bind(updated_at)
                .bind(id)
                .execute(pool)
                .await?;

                let affected = res.rows_affected();
                debug!(
                    table = "user",
                    %id,
                    affected,
                    name_set = name.is_some(),
                    email_set = email.is_some(),
                    email_verified_set = email_verified.is_some(),
                    image_set = image.is_some(),
                    "db patch applied"
                );
                Ok(affected)
            }

            EntityPatch::Order { id, patch } => {
                let OrderPatch {
                    customer_name,
                    customer_email,
                    product_name,
                    amount,
                    status,
                    payment_method,
                    notes,
                } = patch;

                let res = sqlx::query(
                    r#"
                    UPDATE orders
                    SET
                        customer_name = COALESCE(?, customer_name),
                        customer_email = COALESCE(?, customer_email),
                        product_name = COALESCE(?, product_name),
                        amount = COALESCE(?, amount),
                        status = COALESCE(?, status),
                        payment_method = COALESCE(?, payment_method),
                        notes = COALESCE(?, notes),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(customer_name)
                .bind(customer_email)
                .bind(product_name)
                .bind(amount)
                .bind(status)
                .bind(payment_method)
                .bind(notes)
                .bind(updated_at)
                .bind(id)
                .execute(pool)
                .await?;

                let affected = res.rows_affected();
                debug!(
                    table = "orders",
                    %id,
                    affected,
                    amount_set = amount.is_some(),
                    status = ?status,
                    "db patch applied"
                );
                Ok(affected)
            }

            EntityPatch::Payment { id, patch } => {
                let PaymentPatch {
                    customer_name,
                    customer_email,
                    amount,
                    currency,
                    status,
                    payment_method,
                    product_name,
                    metadata,
                } = patch;

                let res = sqlx::query(
                    r#"
                    UPDATE payments
                    SET
                        customer_name = COALESCE(?, customer_name),
                        customer_email = COALESCE(?, customer_email),
                        amount = COALESCE(?, amount),
                        currency = COALESCE(?, currency),
                        status = COALESCE(?, status),
                        payment_method = COALESCE(?, payment_method),
                        product_name = COALESCE(?, product_name),
                        metadata = COALESCE(?, metadata),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(customer_name)
                .bind(customer_email)
                .bind(amount)
                .bind(currency)
                .bind(status)
                .bind(payment_method)
                .bind(product_name)
                .bind(metadata)
                .bind(updated_at)
                .bind(id)
                .execute(pool)
                .await?;

                let affected = res.rows_affected();
                debug!(
                    table = "payments",
                    %id,
                    affected,
                    amount_set = amount.is_some(),
                    status = ?status,
                    "db patch applied"
                );
                Ok(affected)
            }
        }
    }
}
