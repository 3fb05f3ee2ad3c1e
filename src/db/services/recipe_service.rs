//! Recipe persistence, including reconciliation of the nested tag list.

use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, DeleteResult,
    EntityTrait, IntoActiveModel, LoaderTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::debug;

use crate::db::entities::{recipe, recipe_tag, tag};
use crate::db::services::tag_service;
use crate::web::serializers::RecipeInput;

/// A recipe together with the tags associated to it.
pub type RecipeWithTags = (recipe::Model, Vec<tag::Model>);

/// Retrieves all recipes for a user, newest (highest id) first, with tags.
pub async fn get_recipes_with_tags_by_user_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<RecipeWithTags>, DbErr> {
    let recipes = recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(user_id))
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await?;

    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let tags = recipes
        .load_many_to_many(tag::Entity, recipe_tag::Entity, db)
        .await?;

    Ok(recipes.into_iter().zip(tags).collect())
}

pub async fn get_recipe_with_tags_for_user<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    user_id: i32,
) -> Result<Option<RecipeWithTags>, DbErr> {
    let Some(recipe_model) = find_owned_recipe(db, recipe_id, user_id).await? else {
        return Ok(None);
    };
    let tags = recipe_model.find_related(tag::Entity).all(db).await?;
    Ok(Some((recipe_model, tags)))
}

async fn find_owned_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    user_id: i32,
) -> Result<Option<recipe::Model>, DbErr> {
    recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Creates a recipe owned by `user_id` and attaches the requested tags,
/// creating any tag the user does not have yet. Runs in one transaction.
///
/// The caller must have validated `input` as a full (non-partial) payload.
pub async fn create_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    input: RecipeInput,
) -> Result<RecipeWithTags, DbErr> {
    let (Some(title), Some(time_minutes), Some(price)) =
        (input.title, input.time_minutes, input.price)
    else {
        return Err(DbErr::Custom(
            "title, time_minutes and price are required to create a recipe".to_string(),
        ));
    };

    let txn = db.begin().await?;

    let new_recipe = recipe::ActiveModel {
        user_id: Set(user_id),
        title: Set(title),
        time_minutes: Set(time_minutes),
        price: Set(price),
        link: Set(input.link.unwrap_or_default()),
        description: Set(input.description.unwrap_or_default()),
        ..Default::default()
    };
    let recipe_model = new_recipe.insert(&txn).await?;

    let tags = match input.tags {
        Some(names) => attach_tags(&txn, recipe_model.id, user_id, &names).await?,
        None => Vec::new(),
    };

    txn.commit().await?;
    Ok((recipe_model, tags))
}

/// Applies the supplied fields to an owned recipe. If `input.tags` is set,
/// the recipe's tag set is replaced by it. Returns `None` if the recipe does
/// not exist or belongs to another user.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
    input: RecipeInput,
) -> Result<Option<RecipeWithTags>, DbErr> {
    let txn = db.begin().await?;

    let Some(current) = find_owned_recipe(&txn, recipe_id, user_id).await? else {
        return Ok(None);
    };

    let mut active_recipe = current.clone().into_active_model();
    if let Some(title) = input.title {
        active_recipe.title = Set(title);
    }
    if let Some(time_minutes) = input.time_minutes {
        active_recipe.time_minutes = Set(time_minutes);
    }
    if let Some(price) = input.price {
        active_recipe.price = Set(price);
    }
    if let Some(link) = input.link {
        active_recipe.link = Set(link);
    }
    if let Some(description) = input.description {
        active_recipe.description = Set(description);
    }

    let updated = if active_recipe.is_changed() {
        active_recipe.update(&txn).await?
    } else {
        current
    };

    if let Some(names) = input.tags {
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(updated.id))
            .exec(&txn)
            .await?;
        attach_tags(&txn, updated.id, user_id, &names).await?;
    }

    let tags = updated.find_related(tag::Entity).all(&txn).await?;
    txn.commit().await?;
    Ok(Some((updated, tags)))
}

/// Deletes an owned recipe and its tag associations. The tags stay.
pub async fn delete_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<DeleteResult, DbErr> {
    let txn = db.begin().await?;

    if find_owned_recipe(&txn, recipe_id, user_id).await?.is_none() {
        return Ok(DeleteResult { rows_affected: 0 });
    }

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    let result = recipe::Entity::delete_many()
        .filter(recipe::Column::Id.eq(recipe_id))
        .filter(recipe::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(result)
}

/// Get-or-creates each named tag under `user_id` and links it to the recipe.
/// Repeated names are linked once.
async fn attach_tags<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    user_id: i32,
    names: &[String],
) -> Result<Vec<tag::Model>, DbErr> {
    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        let tag_model = tag_service::get_or_create_tag(db, user_id, name).await?;
        if seen.insert(tag_model.id) {
            tags.push(tag_model);
        }
    }

    if !tags.is_empty() {
        let links = tags.iter().map(|t| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(t.id),
        });
        recipe_tag::Entity::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }

    debug!(recipe_id, tag_count = tags.len(), "Attached tags to recipe.");
    Ok(tags)
}
