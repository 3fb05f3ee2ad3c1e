//! The `services` module provides a high-level API for interacting with the database.
//! It encapsulates the query logic and data access patterns, so the HTTP layer
//! works with entity models without building queries itself.
//!
//! Every query that touches a recipe or tag is filtered by the owning user id.
//! A row owned by someone else is indistinguishable from a missing row.

pub mod recipe_service;
pub mod tag_service;
pub mod user_service;

pub use recipe_service::*;
pub use tag_service::*;
pub use user_service::*;
