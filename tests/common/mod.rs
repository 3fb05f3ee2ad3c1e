#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use recipe_api::db::entities::{recipe, tag, user};
use recipe_api::db::{schema, services as db_services};
use recipe_api::server::config::ServerConfig;
use recipe_api::services::auth_service;
use recipe_api::web::{self, serializers::{RecipeInput, UserInput}};
use sea_orm::prelude::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const RECIPES_URL: &str = "/api/recipe/recipes/";
pub const TAGS_URL: &str = "/api/recipe/tags/";

pub fn recipe_detail_url(recipe_id: i32) -> String {
    format!("/api/recipe/recipes/{recipe_id}/")
}

pub fn tag_detail_url(tag_id: i32) -> String {
    format!("/api/recipe/tags/{tag_id}/")
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub config: Arc<ServerConfig>,
}

/// Builds the full router over a fresh in-memory SQLite database.
pub async fn spawn_app() -> TestApp {
    // One connection: every pooled connection to `:memory:` is its own database.
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect to in-memory sqlite");
    schema::sync(&db).await.expect("create schema");

    let config = Arc::new(ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        token_ttl_hours: 1,
        log_dir: "logs".to_string(),
        db_max_connections: 1,
        bcrypt_cost: 4,
    });

    let router = web::create_axum_router(db.clone(), config.clone());
    TestApp { router, db, config }
}

impl TestApp {
    pub async fn create_user(&self, email: &str, password: &str) -> user::Model {
        let input = UserInput {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            name: Some("Test Name".to_string()),
        };
        auth_service::register_user(&self.db, input, self.config.bcrypt_cost)
            .await
            .expect("register user")
    }

    pub fn token_for(&self, user: &user::Model) -> String {
        auth_service::create_token_for_user(user, &self.config.jwt_secret, 1)
            .expect("issue token")
            .token
    }

    /// A user plus a token for them.
    pub async fn authenticated_user(&self, email: &str) -> (user::Model, String) {
        let user = self.create_user(email, "testpass123").await;
        let token = self.token_for(&user);
        (user, token)
    }

    pub async fn create_recipe(&self, owner: &user::Model, title: &str) -> recipe::Model {
        let input = RecipeInput {
            title: Some(title.to_string()),
            time_minutes: Some(22),
            price: Some(Decimal::from_str("5.25").unwrap()),
            link: Some("http://example.com/recipe.pdf".to_string()),
            description: Some("Sample description".to_string()),
            tags: None,
        };
        db_services::create_recipe(&self.db, owner.id, input)
            .await
            .expect("create recipe")
            .0
    }

    pub async fn create_tag(&self, owner: &user::Model, name: &str) -> tag::Model {
        db_services::get_or_create_tag(&self.db, owner.id, name)
            .await
            .expect("create tag")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }
}
