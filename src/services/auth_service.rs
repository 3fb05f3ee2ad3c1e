use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use tracing::info;

use crate::db::entities::user;
use crate::db::services as db_services;
use crate::web::error::AppError;
use crate::web::models::{Claims, TokenResponse};
use crate::web::serializers::{NON_FIELD_ERRORS, TokenRequest, UserInput, ValidationErrors};

const EMAIL_TAKEN: &str = "user with this email already exists.";
const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Registers a user from a validated, non-partial payload.
pub async fn register_user(
    pool: &DatabaseConnection,
    input: UserInput,
    bcrypt_cost: u32,
) -> Result<user::Model, AppError> {
    let (Some(email), Some(password), Some(name)) = (input.email, input.password, input.name) else {
        return Err(AppError::InvalidInput(
            "email, password and name are required.".to_string(),
        ));
    };

    if db_services::get_user_by_email(pool, &email).await?.is_some() {
        return Err(ValidationErrors::single("email", EMAIL_TAKEN).into());
    }

    let password_hash = hash_password(&password, bcrypt_cost)?;
    // The lookup above can race with another registration; the unique index
    // settles it.
    let created = db_services::create_user(pool, &email, &name, &password_hash)
        .await
        .map_err(map_user_write_error)?;
    info!(user_id = created.id, "Registered new user.");
    Ok(created)
}

/// Checks credentials. Any failure, including an inactive account, is
/// reported the same way so callers cannot probe which emails exist.
pub async fn authenticate(
    pool: &DatabaseConnection,
    req: TokenRequest,
) -> Result<user::Model, AppError> {
    let rejected = || AppError::from(ValidationErrors::single(NON_FIELD_ERRORS, BAD_CREDENTIALS));

    let Some(user) = db_services::get_user_by_email(pool, &req.email).await? else {
        return Err(rejected());
    };
    if !user.is_active {
        return Err(rejected());
    }

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        return Err(rejected());
    }
    Ok(user)
}

/// Applies a profile update for the current user. Changing the email to one
/// held by another account is a validation error.
pub async fn update_profile(
    pool: &DatabaseConnection,
    current: user::Model,
    input: UserInput,
    bcrypt_cost: u32,
) -> Result<user::Model, AppError> {
    if let Some(email) = input.email.as_deref() {
        if let Some(existing) = db_services::get_user_by_email(pool, email).await? {
            if existing.id != current.id {
                return Err(ValidationErrors::single("email", EMAIL_TAKEN).into());
            }
        }
    }

    let password_hash = input
        .password
        .as_deref()
        .map(|password| hash_password(password, bcrypt_cost))
        .transpose()?;

    let updated = db_services::update_user(pool, current, input.email, input.name, password_hash)
        .await
        .map_err(map_user_write_error)?;
    Ok(updated)
}

fn map_user_write_error(db_err: DbErr) -> AppError {
    match db_err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ValidationErrors::single("email", EMAIL_TAKEN).into()
        }
        _ => AppError::from(db_err),
    }
}

fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::PasswordHashingError(e.to_string()))
}

pub fn create_token_for_user(
    user: &user::Model,
    jwt_secret: &str,
    ttl_hours: i64,
) -> Result<TokenResponse, AppError> {
    let expiration = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(TokenResponse { token })
}

pub fn decode_token(token: &str, jwt_secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
