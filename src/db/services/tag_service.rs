use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, DeleteResult,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::entities::{recipe_tag, tag};

// --- Tag Service Functions ---

/// Retrieves all tags for a user, ordered by descending name.
pub async fn get_tags_by_user_id<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .order_by_desc(tag::Column::Name)
        .all(db)
        .await
}

pub async fn get_tag_for_user<C: ConnectionTrait>(
    db: &C,
    tag_id: i32,
    user_id: i32,
) -> Result<Option<tag::Model>, DbErr> {
    tag::Entity::find_by_id(tag_id)
        .filter(tag::Column::UserId.eq(user_id))
        .one(db)
        .await
}

async fn find_tag_by_name<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<Option<tag::Model>, DbErr> {
    tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await
}

/// Returns the user's tag with this exact name, creating it if absent.
///
/// The insert is `ON CONFLICT DO NOTHING` against the unique
/// `(user_id, name)` index, so two requests racing on the same new name both
/// end up with the single row that won.
pub async fn get_or_create_tag<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<tag::Model, DbErr> {
    if let Some(existing) = find_tag_by_name(db, user_id, name).await? {
        return Ok(existing);
    }

    insert_tag_if_absent(db, user_id, name).await?;

    find_tag_by_name(db, user_id, name)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("tag '{name}' for user {user_id}")))
}

/// `INSERT ... ON CONFLICT (user_id, name) DO NOTHING`. Returns the number of
/// rows inserted, which is 0 when the tag already exists.
async fn insert_tag_if_absent<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<u64, DbErr> {
    let new_tag = tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_owned()),
        ..Default::default()
    };
    tag::Entity::insert(new_tag)
        .on_conflict(
            OnConflict::columns([tag::Column::UserId, tag::Column::Name])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
}

/// Renames a tag. Returns `None` if the tag does not exist or belongs to
/// another user. A rename onto an existing name of the same user fails with
/// a unique constraint violation.
pub async fn update_tag(
    db: &DatabaseConnection,
    tag_id: i32,
    user_id: i32,
    name: Option<String>,
) -> Result<Option<tag::Model>, DbErr> {
    let Some(current) = get_tag_for_user(db, tag_id, user_id).await? else {
        return Ok(None);
    };

    match name {
        Some(name) if name != current.name => {
            let mut active_tag = current.into_active_model();
            active_tag.name = Set(name);
            Ok(Some(active_tag.update(db).await?))
        }
        _ => Ok(Some(current)),
    }
}

/// Deletes a tag and its recipe associations. The recipes themselves stay.
pub async fn delete_tag(
    db: &DatabaseConnection,
    tag_id: i32,
    user_id: i32,
) -> Result<DeleteResult, DbErr> {
    let txn = db.begin().await?;

    if get_tag_for_user(&txn, tag_id, user_id).await?.is_none() {
        return Ok(DeleteResult { rows_affected: 0 });
    }

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::TagId.eq(tag_id))
        .exec(&txn)
        .await?;
    let result = tag::Entity::delete_many()
        .filter(tag::Column::Id.eq(tag_id))
        .filter(tag::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(result)
}
