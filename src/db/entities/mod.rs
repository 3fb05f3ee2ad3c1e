//! SeaORM Entity Crate
//!
//! Defines the SeaORM entities that map to database tables.
//! Each entity is defined in its own module (e.g., `user.rs`, `recipe.rs`).

pub mod recipe;
pub mod recipe_tag;
pub mod tag;
pub mod user;
