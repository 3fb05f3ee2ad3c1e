use sea_orm::prelude::Decimal;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::db::entities::{recipe, tag};
use crate::web::serializers::tag::{TagInput, TagResponse};
use crate::web::serializers::{CharField, FieldReader, ValidationErrors};

pub const PRICE_MAX_DIGITS: u32 = 5;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Validated recipe payload. `None` means the field was not supplied and must
/// be left untouched (or defaulted, on create).
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct RecipeInput {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub title: Option<String>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub link: Option<String>,
    pub description: Option<String>,
    /// Tag names to reconcile, in payload order.
    pub tags: Option<Vec<String>>,
}

impl RecipeInput {
    /// `partial` is false for create and PUT, true for PATCH.
    pub fn from_json(data: &Value, partial: bool) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(data, partial)?;

        let title = reader.char_field("title", CharField::required());
        let time_minutes = reader.integer_field("time_minutes", true);
        let price = reader.decimal_field("price", true, PRICE_MAX_DIGITS, PRICE_DECIMAL_PLACES);
        let link = reader.char_field("link", CharField::optional());
        let description = reader.char_field("description", CharField::optional());

        let tags = reader.list_field("tags", false).map(|items| {
            let mut names = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match TagInput::from_json(item, false) {
                    Ok(nested) => names.extend(nested.name),
                    Err(nested) => reader
                        .errors_mut()
                        .extend_prefixed(&format!("tags[{index}]"), nested),
                }
            }
            names
        });

        reader.finish_with(Self {
            title,
            time_minutes,
            price,
            link,
            description,
            tags,
        })
    }
}

/// The one wire shape for a recipe, used by every recipe endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub tags: Vec<TagResponse>,
    pub description: String,
}

impl RecipeResponse {
    pub fn new(recipe: recipe::Model, mut tags: Vec<tag::Model>) -> Self {
        tags.sort_by_key(|t| t.id);
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: format_price(recipe.price),
            link: recipe.link,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            description: recipe.description,
        }
    }
}

/// Renders with exactly two decimal places, e.g. `5.2` as `"5.20"`.
pub fn format_price(price: Decimal) -> String {
    let mut rounded = price.round_dp(PRICE_DECIMAL_PLACES);
    rounded.rescale(PRICE_DECIMAL_PLACES);
    rounded.to_string()
}
