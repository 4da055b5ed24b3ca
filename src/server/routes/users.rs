use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::{json_body, required};
use crate::db::{DbUser, EntityPatch, UserCreate, UserPatch, UserStats};
use crate::error::MeetmindError;
use crate::server::router::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users).post(create_user))
        .route("/api/admin/users/stats", get(user_stats))
        .route(
            "/api/admin/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Maps the `user.email` unique constraint onto a 409.
fn email_conflict(err: MeetmindError) -> MeetmindError {
    match err {
        MeetmindError::DatabaseError(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            MeetmindError::Conflict("Email already exists".to_string())
        }
        other => other,
    }
}

fn check_email(email: &str) -> Result<(), MeetmindError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(MeetmindError::bad_request("email is invalid")),
    }
}

#[derive(Debug, Deserialize)]
pub struct UserSearch {
    pub search: Option<String>,
}

/// GET /api/admin/users?search=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearch>,
) -> Result<Json<Vec<DbUser>>, MeetmindError> {
    Ok(Json(state.db.list_users(query.search).await?))
}

/// GET /api/admin/users/stats
pub async fn user_stats(State(state): State<AppState>) -> Result<Json<UserStats>, MeetmindError> {
    Ok(Json(state.db.user_stats().await?))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DbUser>, MeetmindError> {
    state
        .db
        .get_user(id)
        .await?
        .map(Json)
        .ok_or(MeetmindError::NotFound("User not found"))
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<DbUser>, MeetmindError> {
    let body = json_body(payload)?;
    let name = required("name", body.name)?;
    let email = required("email", body.email)?;
    check_email(&email)?;

    let user = state
        .db
        .create_user(UserCreate {
            name,
            email,
            image: body.image.filter(|i| !i.trim().is_empty()),
        })
        .await
        .map_err(email_conflict)?;
    info!(user_id = %user.id, "user created");
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "email_verified")]
    pub email_verified: Option<bool>,
    pub image: Option<String>,
}

/// PATCH /api/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<DbUser>, MeetmindError> {
    let body = json_body(payload)?;
    let name = body.name.map(|n| required("name", Some(n)));
    let email = body.email.map(|e| required("email", Some(e)));
    let (name, email) = (name.transpose()?, email.transpose()?);
    if let Some(email) = &email {
        check_email(email)?;
    }

    let affected = state
        .db
        .patch(EntityPatch::User {
            id: id.clone(),
            patch: UserPatch {
                name,
                email,
                email_verified: body.email_verified,
                image: body.image,
            },
        })
        .await
        .map_err(email_conflict)?;
    if affected == 0 {
        return Err(MeetmindError::NotFound("User not found"));
    }
    state
        .db
        .get_user(id)
        .await?
        .map(Json)
        .ok_or(MeetmindError::NotFound("User not found"))
}

/// DELETE /api/admin/users/{id}
///
/// Sessions, agents and meetings go with the user through `ON DELETE CASCADE`.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, MeetmindError> {
    if !state.db.delete_user(id.clone()).await? {
        return Err(MeetmindError::NotFound("User not found"));
    }
    info!(user_id = %id, "user deleted");
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_needs_both_sides_of_the_at() {
        assert!(check_email("ann@x.io").is_ok());
        assert!(check_email("ann@").is_err());
        assert!(check_email("@x.io").is_err());
        assert!(check_email("ann").is_err());
    }

    #[test]
    fn other_errors_pass_through_conflict_mapping() {
        let err = email_conflict(MeetmindError::NotFound("User not found"));
        assert_eq!(err.public_message(), "User not found");
    }
}
