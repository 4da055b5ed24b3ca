use crate::db::SessionUser;
use crate::error::MeetmindError;
use crate::server::router::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

pub const SESSION_COOKIE: &str = "better-auth.session_token";

/// The cookie value is `<token>.<signature>`; only the token is stored.
fn token_from_cookie(value: &str) -> Option<&str> {
    value.split('.').next().filter(|t| !t.is_empty())
}

fn extract_session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(token) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| token_from_cookie(c.value()))
    {
        return Some(token.to_string());
    }
    parts
        .headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Caller of a session-scoped route, resolved from an unexpired session row.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = MeetmindError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(parts).ok_or(MeetmindError::Unauthorized)?;
        match state.db.resolve_session(token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                debug!("session token unknown or expired");
                Err(MeetmindError::Unauthorized)
            }
        }
    }
}
