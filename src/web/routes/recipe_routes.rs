use axum::{Router, routing::get};
use std::sync::Arc;

use crate::web::AppState;
use crate::web::viewsets::{self, RecipeViewSet};

pub fn create_recipe_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/recipes/",
            get(viewsets::list::<RecipeViewSet>).post(viewsets::create::<RecipeViewSet>),
        )
        .route(
            "/recipes/{recipe_id}/",
            get(viewsets::retrieve::<RecipeViewSet>)
                .put(viewsets::update::<RecipeViewSet>)
                .patch(viewsets::partial_update::<RecipeViewSet>)
                .delete(viewsets::destroy::<RecipeViewSet>),
        )
}
