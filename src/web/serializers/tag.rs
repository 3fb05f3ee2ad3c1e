use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::db::entities::tag;
use crate::web::serializers::{CharField, FieldReader, ValidationErrors};

/// Writable tag fields. `id` and any owner field are read-only and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct TagInput {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,
}

impl TagInput {
    pub fn from_json(data: &Value, partial: bool) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(data, partial)?;
        let name = reader.char_field("name", CharField::required());
        reader.finish_with(Self { name })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_is_read_only() {
        let input = TagInput::from_json(&json!({ "id": 99, "name": "Vegan" }), false).unwrap();
        assert_eq!(input.name.as_deref(), Some("Vegan"));
    }

    #[test]
    fn test_name_required_on_full_update() {
        let errors = TagInput::from_json(&json!({}), false).unwrap_err();
        assert_eq!(errors.get("name").unwrap(), ["This field is required."]);
        assert_eq!(TagInput::from_json(&json!({}), true).unwrap().name, None);
    }

    #[test]
    fn test_response_shape() {
        let response = TagResponse::from(tag::Model {
            id: 3,
            user_id: 7,
            name: "Dessert".to_string(),
        });
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({ "id": 3, "name": "Dessert" })
        );
    }
}
