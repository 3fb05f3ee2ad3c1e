use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;

use crate::db::services as db_services;
use crate::services::auth_service;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

pub const TOKEN_COOKIE: &str = "token";

/// Resolves the request's token to an `AuthenticatedUser` extension, or
/// rejects with 401 before any handler runs.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    // Try to get token from Authorization header first, then fall back to cookie
    let token = token_from_headers(req.headers())
        .or_else(|| jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
        })?;

    let claims = auth_service::decode_token(&token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = ?e, "JWT decoding error during auth middleware.");
        AppError::Unauthorized("Invalid token.".to_string())
    })?;

    let user = db_services::get_user_by_id(&state.db_pool, claims.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            warn!(user_id = claims.user_id, "Token presented for a missing or inactive user.");
            AppError::Unauthorized("User inactive or deleted.".to_string())
        })?;

    req.extensions_mut().insert(AuthenticatedUser { id: user.id });
    Ok(next.run(req).await)
}

/// Accepts both `Bearer <token>` and `Token <token>` schemes.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_token_schemes() {
        assert_eq!(token_from_headers(&headers_with("Bearer abc")).as_deref(), Some("abc"));
        assert_eq!(token_from_headers(&headers_with("Token abc")).as_deref(), Some("abc"));
        assert_eq!(token_from_headers(&headers_with("Basic abc")), None);
        assert_eq!(token_from_headers(&headers_with("Bearer ")), None);
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }
}
