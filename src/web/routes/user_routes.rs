use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use axum_extra::extract::{
    WithRejection,
    cookie::{Cookie, CookieJar, SameSite},
};
use serde_json::Value;
use std::sync::Arc;

use crate::db::{entities::user, services as db_services};
use crate::services::auth_service;
use crate::web::middleware::auth::TOKEN_COOKIE;
use crate::web::models::{AuthenticatedUser, TokenResponse};
use crate::web::serializers::{TokenRequest, UserInput, UserResponse};
use crate::web::{AppError, AppState};

/// Registration and token issuance; no authentication required.
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create/", post(create_user_handler))
        .route("/token/", post(create_token_handler))
}

/// Self-service profile endpoints for the authenticated user.
pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/me/",
        get(get_me_handler)
            .put(update_me_handler)
            .patch(partial_update_me_handler),
    )
}

async fn create_user_handler(
    State(app_state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<Value>, AppError>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let input = UserInput::from_json(&payload, false)?;
    let created =
        auth_service::register_user(&app_state.db_pool, input, app_state.config.bcrypt_cost)
            .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

async fn create_token_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<Value>, AppError>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let request = TokenRequest::from_json(&payload)?;
    let user = auth_service::authenticate(&app_state.db_pool, request).await?;
    let token_response = auth_service::create_token_for_user(
        &user,
        &app_state.config.jwt_secret,
        app_state.config.token_ttl_hours,
    )?;

    let auth_cookie = Cookie::build((TOKEN_COOKIE, token_response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    Ok((jar.add(auth_cookie), Json(token_response)))
}

async fn current_user(
    app_state: &AppState,
    auth_user: &AuthenticatedUser,
) -> Result<user::Model, AppError> {
    db_services::get_user_by_id(&app_state.db_pool, auth_user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User inactive or deleted.".to_string()))
}

async fn get_me_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    let user = current_user(&app_state, &auth_user).await?;
    Ok(Json(UserResponse::from(user)))
}

async fn update_me(
    app_state: &AppState,
    auth_user: &AuthenticatedUser,
    payload: &Value,
    partial: bool,
) -> Result<UserResponse, AppError> {
    let input = UserInput::from_json(payload, partial)?;
    let user = current_user(app_state, auth_user).await?;
    let cost = app_state.config.bcrypt_cost;
    let updated = auth_service::update_profile(&app_state.db_pool, user, input, cost).await?;
    Ok(UserResponse::from(updated))
}

async fn update_me_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<Value>, AppError>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(update_me(&app_state, &auth_user, &payload, false).await?))
}

async fn partial_update_me_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<Value>, AppError>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(update_me(&app_state, &auth_user, &payload, true).await?))
}
