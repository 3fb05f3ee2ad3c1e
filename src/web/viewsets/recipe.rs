use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tracing::info;

use crate::db::services as db_services;
use crate::web::models::AuthenticatedUser;
use crate::web::serializers::{RecipeInput, RecipeResponse};
use crate::web::viewsets::{
    CreateAction, DestroyAction, ListAction, RetrieveAction, UpdateAction, ViewSet,
};
use crate::web::{AppError, AppState};

/// Full CRUD over the caller's recipes.
pub struct RecipeViewSet {
    db: DatabaseConnection,
}

impl ViewSet for RecipeViewSet {
    type Item = RecipeResponse;

    const NOT_FOUND: &'static str = "Recipe not found.";

    fn from_state(state: &AppState) -> Self {
        Self {
            db: state.db_pool.clone(),
        }
    }
}

#[async_trait]
impl ListAction for RecipeViewSet {
    async fn list(&self, user: &AuthenticatedUser) -> Result<Vec<RecipeResponse>, AppError> {
        let recipes = db_services::get_recipes_with_tags_by_user_id(&self.db, user.id).await?;
        Ok(recipes
            .into_iter()
            .map(|(recipe, tags)| RecipeResponse::new(recipe, tags))
            .collect())
    }
}

#[async_trait]
impl RetrieveAction for RecipeViewSet {
    async fn retrieve(
        &self,
        user: &AuthenticatedUser,
        id: i32,
    ) -> Result<RecipeResponse, AppError> {
        let (recipe, tags) = db_services::get_recipe_with_tags_for_user(&self.db, id, user.id)
            .await?
            .ok_or_else(|| AppError::NotFound(Self::NOT_FOUND.to_string()))?;
        Ok(RecipeResponse::new(recipe, tags))
    }
}

#[async_trait]
impl CreateAction for RecipeViewSet {
    async fn create(
        &self,
        user: &AuthenticatedUser,
        payload: Value,
    ) -> Result<RecipeResponse, AppError> {
        let input = RecipeInput::from_json(&payload, false)?;
        let (recipe, tags) = db_services::create_recipe(&self.db, user.id, input).await?;
        info!(
            user_id = user.id,
            recipe_id = recipe.id,
            tag_count = tags.len(),
            "Created recipe."
        );
        Ok(RecipeResponse::new(recipe, tags))
    }
}

#[async_trait]
impl UpdateAction for RecipeViewSet {
    async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i32,
        payload: Value,
        partial: bool,
    ) -> Result<RecipeResponse, AppError> {
        let input = RecipeInput::from_json(&payload, partial)?;
        let (recipe, tags) = db_services::update_recipe(&self.db, id, user.id, input)
            .await?
            .ok_or_else(|| AppError::NotFound(Self::NOT_FOUND.to_string()))?;
        info!(user_id = user.id, recipe_id = recipe.id, partial, "Updated recipe.");
        Ok(RecipeResponse::new(recipe, tags))
    }
}

#[async_trait]
impl DestroyAction for RecipeViewSet {
    async fn destroy(&self, user: &AuthenticatedUser, id: i32) -> Result<(), AppError> {
        let delete_result = db_services::delete_recipe(&self.db, id, user.id).await?;
        if delete_result.rows_affected == 0 {
            return Err(AppError::NotFound(Self::NOT_FOUND.to_string()));
        }
        info!(user_id = user.id, recipe_id = id, "Deleted recipe.");
        Ok(())
    }
}
