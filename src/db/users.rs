//! `user` and `session` queries.

use chrono::Utc;
use sqlx::SqlitePool;

use super::like_contains;
use super::models::{DbUser, SessionUser, UserStats};
use super::patch::{SessionCreate, UserCreate};
use crate::error::MeetmindError;
use crate::utils::ids::nanoid;

const USER_COLUMNS: &str = "id, name, email, email_verified, image, created_at, updated_at";

pub(super) async fn list(
    pool: &SqlitePool,
    search: Option<String>,
) -> Result<Vec<DbUser>, MeetmindError> {
    let rows = match search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = like_contains(term);
            sqlx::query_as::<_, DbUser>(&format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM "user"
                WHERE name LIKE ? ESCAPE '\' OR email LIKE ? ESCAPE '\'
                ORDER BY created_at DESC
                "#
            ))
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbUser>(&format!(
                r#"SELECT {USER_COLUMNS} FROM "user" ORDER BY created_at DESC"#
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

pub(super) async fn stats(pool: &SqlitePool) -> Result<UserStats, MeetmindError> {
    let (total, verified): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(CASE WHEN email_verified THEN 1 ELSE 0 END), 0)
        FROM "user"
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(UserStats {
        total,
        verified,
        unverified: total - verified,
    })
}

pub(super) async fn get(pool: &SqlitePool, id: &str) -> Result<Option<DbUser>, MeetmindError> {
    let row = sqlx::query_as::<_, DbUser>(&format!(
        r#"SELECT {USER_COLUMNS} FROM "user" WHERE id = ?"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub(super) async fn create(pool: &SqlitePool, create: UserCreate) -> Result<DbUser, MeetmindError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, DbUser>(&format!(
        r#"
        INSERT INTO "user" (id, name, email, email_verified, image, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(nanoid())
    .bind(create.name)
    .bind(create.email)
    .bind(create.image)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub(super) async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, MeetmindError> {
    let res = sqlx::query(r#"DELETE FROM "user" WHERE id = ?"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub(super) async fn create_session(
    pool: &SqlitePool,
    create: SessionCreate,
) -> Result<String, MeetmindError> {
    let now = Utc::now();
    let id: String = sqlx::query_scalar(
        r#"
        INSERT INTO session (
            id, expires_at, token, created_at, updated_at, ip_address, user_agent, user_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(nanoid())
    .bind(create.expires_at)
    .bind(create.token)
    .bind(now)
    .bind(now)
    .bind(create.ip_address)
    .bind(create.user_agent)
    .bind(create.user_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Resolves a session token to its user, ignoring expired sessions.
pub(super) async fn resolve_session(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<SessionUser>, MeetmindError> {
    let row = sqlx::query_as::<_, SessionUser>(
        r#"
        SELECT s.id AS session_id, u.id AS user_id, u.name, u.email, s.expires_at
        FROM session s
        JOIN "user" u ON u.id = s.user_id
        WHERE s.token = ? AND s.expires_at > ?
        "#,
    )
    .bind(token)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
