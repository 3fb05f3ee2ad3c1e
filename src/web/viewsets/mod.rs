//! Resource handlers.
//!
//! Each CRUD capability is its own trait. A resource implements only the
//! capabilities it exposes, and its router wires the matching generic
//! handlers below, so an unsupported operation simply has no route.
//!
//! The authenticated caller is passed explicitly to every operation; all
//! lookups are scoped to that user.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::web::models::AuthenticatedUser;
use crate::web::{AppError, AppState};

pub mod recipe;
pub mod tag;

pub use recipe::RecipeViewSet;
pub use tag::TagViewSet;

pub trait ViewSet: Sized + Send + Sync + 'static {
    /// Wire representation of one resource.
    type Item: Serialize + Send + 'static;

    /// Message for a missing, foreign-owned or malformed id.
    const NOT_FOUND: &'static str;

    fn from_state(state: &AppState) -> Self;
}

#[async_trait]
pub trait ListAction: ViewSet {
    async fn list(&self, user: &AuthenticatedUser) -> Result<Vec<Self::Item>, AppError>;
}

#[async_trait]
pub trait RetrieveAction: ViewSet {
    async fn retrieve(&self, user: &AuthenticatedUser, id: i32) -> Result<Self::Item, AppError>;
}

#[async_trait]
pub trait CreateAction: ViewSet {
    async fn create(&self, user: &AuthenticatedUser, payload: Value)
        -> Result<Self::Item, AppError>;
}

#[async_trait]
pub trait UpdateAction: ViewSet {
    /// `partial` is true for PATCH: absent fields are left unchanged and none
    /// are required.
    async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i32,
        payload: Value,
        partial: bool,
    ) -> Result<Self::Item, AppError>;
}

#[async_trait]
pub trait DestroyAction: ViewSet {
    async fn destroy(&self, user: &AuthenticatedUser, id: i32) -> Result<(), AppError>;
}

// --- Generic Route Handlers ---

/// Ids are taken from the path as text so that one which is not a number,
/// or does not fit in an `i32`, is a 404 like any other unknown id.
fn parse_id<V: ViewSet>(raw: &str) -> Result<i32, AppError> {
    raw.parse().map_err(|_| AppError::NotFound(V::NOT_FOUND.to_string()))
}

pub async fn list<V: ListAction>(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<V::Item>>, AppError> {
    let items = V::from_state(&app_state).list(&user).await?;
    Ok(Json(items))
}

pub async fn retrieve<V: RetrieveAction>(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<V::Item>, AppError> {
    let item = V::from_state(&app_state).retrieve(&user, parse_id::<V>(&id)?).await?;
    Ok(Json(item))
}

pub async fn create<V: CreateAction>(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<Value>, AppError>,
) -> Result<(StatusCode, Json<V::Item>), AppError> {
    let item = V::from_state(&app_state).create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update<V: UpdateAction>(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<Value>, AppError>,
) -> Result<Json<V::Item>, AppError> {
    let id = parse_id::<V>(&id)?;
    let item = V::from_state(&app_state)
        .update(&user, id, payload, false)
        .await?;
    Ok(Json(item))
}

pub async fn partial_update<V: UpdateAction>(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<Value>, AppError>,
) -> Result<Json<V::Item>, AppError> {
    let id = parse_id::<V>(&id)?;
    let item = V::from_state(&app_state)
        .update(&user, id, payload, true)
        .await?;
    Ok(Json(item))
}

pub async fn destroy<V: DestroyAction>(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    V::from_state(&app_state).destroy(&user, parse_id::<V>(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
