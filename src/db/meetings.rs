//! `agent` and `meetings` queries, always scoped to one user.

use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{DbAgent, DbAgentWithMeetings, DbMeeting, DbMeetingDetail};
use super::patch::{AgentCreate, MeetingCreate};
use crate::error::MeetmindError;
use crate::utils::ids::nanoid;

pub(super) async fn list_agents(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<DbAgentWithMeetings>, MeetmindError> {
    let rows = sqlx::query_as::<_, DbAgentWithMeetings>(
        r#"
        SELECT a.id, a.name, a.user_id, a.instructions, a.created_at, a.updated_at,
               COUNT(m.id) AS meeting_count
        FROM agent a
        LEFT JOIN meetings m ON m.agent_id = a.id
        WHERE a.user_id = ?
        GROUP BY a.id
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub(super) async fn create_agent(
    pool: &SqlitePool,
    create: AgentCreate,
) -> Result<DbAgent, MeetmindError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, DbAgent>(
        r#"
        INSERT INTO agent (id, name, user_id, instructions, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, name, user_id, instructions, created_at, updated_at
        "#,
    )
    .bind(nanoid())
    .bind(create.name)
    .bind(create.user_id)
    .bind(create.instructions)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub(super) async fn list_meetings(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<DbMeetingDetail>, MeetmindError> {
    let rows = sqlx::query_as::<_, DbMeetingDetail>(
        r#"
        SELECT m.id, m.name, m.user_id, m.agent_id, m.status, m.started_at, m.ended_at,
               m.transcript_url, m.recording_url, m.summary, m.created_at, m.updated_at,
               a.name AS agent_name, u.name AS user_name, u.email AS user_email
        FROM meetings m
        JOIN agent a ON a.id = m.agent_id
        JOIN "user" u ON u.id = m.user_id
        WHERE m.user_id = ?
        ORDER BY m.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Creates a meeting if the agent belongs to the same user; `None` otherwise.
pub(super) async fn create_meeting(
    pool: &SqlitePool,
    create: MeetingCreate,
) -> Result<Option<DbMeeting>, MeetmindError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, DbMeeting>(
        r#"
        INSERT INTO meetings (id, name, user_id, agent_id, status, created_at, updated_at)
        SELECT ?, ?, a.user_id, a.id, 'upcoming', ?, ?
        FROM agent a
        WHERE a.id = ? AND a.user_id = ?
        RETURNING id, name, user_id, agent_id, status, started_at, ended_at,
                  transcript_url, recording_url, summary, created_at, updated_at
        "#,
    )
    .bind(nanoid())
    .bind(create.name)
    .bind(now)
    .bind(now)
    .bind(create.agent_id)
    .bind(create.user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
