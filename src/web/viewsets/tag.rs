use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use serde_json::Value;
use tracing::info;

use crate::db::services as db_services;
use crate::web::models::AuthenticatedUser;
use crate::web::serializers::{TagInput, TagResponse};
use crate::web::viewsets::{DestroyAction, ListAction, UpdateAction, ViewSet};
use crate::web::{AppError, AppState};

/// List, update and delete over the caller's tags. Tags are only created as
/// a side effect of writing a recipe, and there is no single-tag read.
pub struct TagViewSet {
    db: DatabaseConnection,
}

impl ViewSet for TagViewSet {
    type Item = TagResponse;

    const NOT_FOUND: &'static str = "Tag not found.";

    fn from_state(state: &AppState) -> Self {
        Self {
            db: state.db_pool.clone(),
        }
    }
}

#[async_trait]
impl ListAction for TagViewSet {
    async fn list(&self, user: &AuthenticatedUser) -> Result<Vec<TagResponse>, AppError> {
        let tags = db_services::get_tags_by_user_id(&self.db, user.id).await?;
        Ok(tags.into_iter().map(TagResponse::from).collect())
    }
}

#[async_trait]
impl UpdateAction for TagViewSet {
    async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i32,
        payload: Value,
        partial: bool,
    ) -> Result<TagResponse, AppError> {
        let input = TagInput::from_json(&payload, partial)?;
        let tag = db_services::update_tag(&self.db, id, user.id, input.name)
            .await
            .map_err(map_tag_write_error)?
            .ok_or_else(|| AppError::NotFound(Self::NOT_FOUND.to_string()))?;
        info!(user_id = user.id, tag_id = tag.id, "Updated tag.");
        Ok(TagResponse::from(tag))
    }
}

#[async_trait]
impl DestroyAction for TagViewSet {
    async fn destroy(&self, user: &AuthenticatedUser, id: i32) -> Result<(), AppError> {
        let delete_result = db_services::delete_tag(&self.db, id, user.id).await?;
        if delete_result.rows_affected == 0 {
            return Err(AppError::NotFound(Self::NOT_FOUND.to_string()));
        }
        info!(user_id = user.id, tag_id = id, "Deleted tag.");
        Ok(())
    }
}

fn map_tag_write_error(db_err: DbErr) -> AppError {
    match db_err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A tag with this name already exists.".to_string())
        }
        _ => AppError::DatabaseError(db_err.to_string()),
    }
}
