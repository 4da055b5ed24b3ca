use crate::server::router::AppState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde_json::json;
use subtle::ConstantTimeEq;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

fn extract_header_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(k) = headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(k.to_string());
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

fn extract_query_token(query: Option<&str>) -> Option<String> {
    query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned())
    })
}

/// Admin-key guard for `/api/admin/**`, `/api/payments/**` and `/api/polar/reports`.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdminKey;

impl FromRequestParts<AppState> for RequireAdminKey {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_header_token(&parts.headers).or_else(|| extract_query_token(parts.uri.query()));

        match token {
            Some(key) => {
                let expected = state.admin_key.as_ref();
                if key.as_bytes().ct_eq(expected.as_bytes()).into() {
                    Ok(RequireAdminKey)
                } else {
                    Err(AuthError::InvalidKey)
                }
            }
            None => Err(AuthError::MissingKey),
        }
    }
}

pub enum AuthError {
    MissingKey,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let reason = match self {
            AuthError::MissingKey => "Missing admin key",
            AuthError::InvalidKey => "Invalid admin key",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized", "reason": reason })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn admin_header_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_KEY_HEADER, "from-header".parse().unwrap());
        headers.insert("authorization", "Bearer from-bearer".parse().unwrap());
        let token = extract_header_token(&headers);
        assert_eq!(token.as_deref(), Some("from-header"));

        headers.remove(ADMIN_KEY_HEADER);
        let token = extract_header_token(&headers);
        assert_eq!(token.as_deref(), Some("from-bearer"));
    }

    #[test]
    fn query_key_is_url_decoded() {
        assert_eq!(
            extract_query_token(Some("type=summary&key=a%2Bb")).as_deref(),
            Some("a+b")
        );
        assert_eq!(extract_query_token(Some("type=summary")), None);
        assert_eq!(extract_query_token(None), None);
    }
}
