//! Creates the tables and indexes backing the entities.
//!
//! Statements are generated from the entity definitions for whichever backend
//! the connection speaks, and are all `IF NOT EXISTS`, so running this on every
//! startup is safe.

use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::db::entities::{recipe, recipe_tag, tag, user};

pub async fn sync(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Order matters: referenced tables first.
    let tables: Vec<TableCreateStatement> = vec![
        create_table(&schema, user::Entity),
        create_table(&schema, recipe::Entity),
        create_table(&schema, tag::Entity),
        create_table(&schema, recipe_tag::Entity),
    ];
    for stmt in &tables {
        db.execute(backend.build(stmt)).await?;
    }

    for stmt in &indexes() {
        db.execute(backend.build(stmt)).await?;
    }

    info!(backend = ?backend, "Database schema is up to date.");
    Ok(())
}

fn create_table<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    stmt
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        // Backs the atomic tag get-or-create.
        Index::create()
            .name("idx_tags_user_id_name")
            .table(tag::Entity)
            .col(tag::Column::UserId)
            .col(tag::Column::Name)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_recipes_user_id")
            .table(recipe::Entity)
            .col(recipe::Column::UserId)
            .if_not_exists()
            .to_owned(),
    ]
}
