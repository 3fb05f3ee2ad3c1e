use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::db::entities::user;
use crate::web::serializers::{CharField, FieldReader, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct UserInput {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub email: Option<String>,
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: Option<String>,
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,
}

impl UserInput {
    pub fn from_json(data: &Value, partial: bool) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(data, partial)?;
        let email = reader
            .char_field("email", CharField::required())
            .map(|e| normalize_email(&e));
        let password = reader.char_field("password", CharField::required().no_trim());
        let name = reader.char_field("name", CharField::required());
        reader.finish_with(Self {
            email,
            password,
            name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct TokenRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub password: String,
}

impl TokenRequest {
    pub fn from_json(data: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(data, false)?;
        let email = reader.char_field("email", CharField::required());
        let password = reader.char_field("password", CharField::required().no_trim());
        let (Some(email), Some(password)) = (email, password) else {
            // A required field is missing or invalid, so this is always Err.
            return Err(reader.finish().err().unwrap_or_default());
        };
        reader.finish_with(Self {
            email: normalize_email(&email),
            password,
        })
    }
}

/// Public view of a user; the password hash is never rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            email: model.email,
            name: model.name,
        }
    }
}

/// Lowercases the domain part; the local part is case-sensitive.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("Test1@EXAMPLE.com"), "Test1@example.com");
        assert_eq!(normalize_email("test4@example.COM"), "test4@example.com");
    }

    #[test]
    fn test_register_payload() {
        let input = UserInput::from_json(
            &json!({ "email": "user@Example.com", "password": "testpass123", "name": "Test" }),
            false,
        )
        .unwrap();
        assert_eq!(input.email.as_deref(), Some("user@example.com"));
        assert_eq!(input.password.as_deref(), Some("testpass123"));
    }

    #[test]
    fn test_password_too_short() {
        let errors = UserInput::from_json(
            &json!({ "email": "user@example.com", "password": "pw", "name": "Test" }),
            false,
        )
        .unwrap_err();
        assert_eq!(
            errors.get("password").unwrap(),
            ["Ensure this field has at least 5 characters."]
        );
    }

    #[test]
    fn test_invalid_email_rejected() {
        let errors = UserInput::from_json(
            &json!({ "email": "not-an-email", "password": "testpass123", "name": "Test" }),
            false,
        )
        .unwrap_err();
        assert_eq!(errors.get("email").unwrap(), ["Enter a valid email address."]);

        let errors =
            TokenRequest::from_json(&json!({ "email": "nope", "password": "pw" })).unwrap_err();
        assert_eq!(errors.get("email").unwrap(), ["Enter a valid email address."]);
    }

    #[test]
    fn test_partial_profile_update() {
        let input = UserInput::from_json(&json!({ "name": "New" }), true).unwrap();
        assert_eq!(input.name.as_deref(), Some("New"));
        assert_eq!(input.email, None);
        assert_eq!(input.password, None);
    }

    #[test]
    fn test_token_request_requires_both_fields() {
        let errors = TokenRequest::from_json(&json!({ "email": "user@example.com" })).unwrap_err();
        assert_eq!(errors.get("password").unwrap(), ["This field is required."]);
    }
}
