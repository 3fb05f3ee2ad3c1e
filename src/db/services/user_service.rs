use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::db::entities::user;

// --- User Service Functions ---

/// Creates a new active, non-staff user.
pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<user::Model, DbErr> {
    let new_user = user::ActiveModel {
        email: Set(email.to_owned()),
        name: Set(name.to_owned()),
        password_hash: Set(password_hash.to_owned()),
        is_active: Set(true),
        is_staff: Set(false),
        ..Default::default()
    };
    new_user.insert(db).await
}

pub async fn get_user_by_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(user_id).one(db).await
}

pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

/// Applies the supplied changes; `None` leaves a column untouched.
pub async fn update_user(
    db: &DatabaseConnection,
    current: user::Model,
    email: Option<String>,
    name: Option<String>,
    password_hash: Option<String>,
) -> Result<user::Model, DbErr> {
    let mut active_user: user::ActiveModel = current.clone().into();
    if let Some(email) = email {
        active_user.email = Set(email);
    }
    if let Some(name) = name {
        active_user.name = Set(name);
    }
    if let Some(password_hash) = password_hash {
        active_user.password_hash = Set(password_hash);
    }

    if active_user.is_changed() {
        active_user.update(db).await
    } else {
        Ok(current)
    }
}
