use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;

use crate::web::AppState;
use crate::web::viewsets::{self, TagViewSet};

// No POST on the collection and no GET on a single tag: both answer 405.
pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tags/", get(viewsets::list::<TagViewSet>))
        .route(
            "/tags/{tag_id}/",
            put(viewsets::update::<TagViewSet>)
                .patch(viewsets::partial_update::<TagViewSet>)
                .delete(viewsets::destroy::<TagViewSet>),
        )
}
