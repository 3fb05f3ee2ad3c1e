//! Request validation and response rendering.
//!
//! Payloads arrive as untyped JSON so that every field can be checked and all
//! problems reported together, keyed by field name, instead of failing on the
//! first bad value the way a typed `Json<T>` extractor would.
//!
//! Checking happens in two passes. `FieldReader` coerces JSON values into
//! typed fields (presence, null, type, blank). The input structs then carry
//! their length, range and format rules as `validator` attributes, checked by
//! `FieldReader::finish_with`.

use std::collections::BTreeMap;
use std::str::FromStr;

use sea_orm::prelude::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use validator::Validate;

pub mod recipe;
pub mod tag;
pub mod user;

pub use recipe::{RecipeInput, RecipeResponse};
pub use tag::{TagInput, TagResponse};
pub use user::{TokenRequest, UserInput, UserResponse};

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name to the list of messages for that field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Merges errors of a nested object under `prefix`, e.g. `tags[1].name`.
    pub fn extend_prefixed(&mut self, prefix: &str, nested: ValidationErrors) {
        for (field, messages) in nested.0 {
            let key = if field == NON_FIELD_ERRORS {
                prefix.to_string()
            } else {
                format!("{prefix}.{field}")
            };
            self.0.entry(key).or_default().extend(messages);
        }
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(rule_errors: validator::ValidationErrors) -> Self {
        let mut errors = Self::default();
        for (field, field_errors) in rule_errors.field_errors() {
            for error in field_errors {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                };
                errors.add(field.to_string(), message);
            }
        }
        errors
    }
}

/// How a text field is read out of the payload.
#[derive(Debug, Clone, Copy)]
pub struct CharField {
    pub required: bool,
    pub allow_blank: bool,
    pub trim_whitespace: bool,
}

impl CharField {
    pub const fn required() -> Self {
        Self {
            required: true,
            allow_blank: false,
            trim_whitespace: true,
        }
    }

    pub const fn optional() -> Self {
        Self {
            required: false,
            allow_blank: true,
            ..Self::required()
        }
    }

    pub const fn no_trim(mut self) -> Self {
        self.trim_whitespace = false;
        self
    }
}

/// Reads typed values out of a JSON object, accumulating errors as it goes.
///
/// With `partial` set, missing required fields are not reported; this is
/// what PATCH requests use.
pub struct FieldReader<'a> {
    data: &'a Map<String, Value>,
    partial: bool,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a Value, partial: bool) -> Result<Self, ValidationErrors> {
        match data {
            Value::Object(map) => Ok(Self {
                data: map,
                partial,
                errors: ValidationErrors::default(),
            }),
            other => Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type_name(other)
                ),
            )),
        }
    }

    pub fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    /// Returns the value if present and not null. A missing required field or
    /// an explicit null is recorded as an error.
    fn lookup(&mut self, name: &str, required: bool) -> Option<&'a Value> {
        let data: &'a Map<String, Value> = self.data;
        match data.get(name) {
            None => {
                if required && !self.partial {
                    self.errors.add(name, "This field is required.");
                }
                None
            }
            Some(Value::Null) => {
                self.errors.add(name, "This field may not be null.");
                None
            }
            Some(value) => Some(value),
        }
    }

    pub fn char_field(&mut self, name: &str, rules: CharField) -> Option<String> {
        let value = self.lookup(name, rules.required)?;
        let raw = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.errors.add(name, "Not a valid string.");
                return None;
            }
        };
        let text = if rules.trim_whitespace {
            raw.trim().to_string()
        } else {
            raw
        };

        if text.is_empty() && !rules.allow_blank {
            self.errors.add(name, "This field may not be blank.");
            return None;
        }
        Some(text)
    }

    pub fn integer_field(&mut self, name: &str, required: bool) -> Option<i32> {
        let value = self.lookup(name, required)?;
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(number) = parsed else {
            self.errors.add(name, "A valid integer is required.");
            return None;
        };

        match i32::try_from(number) {
            Ok(n) => Some(n),
            Err(_) => {
                self.errors.add(
                    name,
                    format!("Ensure this value is less than or equal to {}.", i32::MAX),
                );
                None
            }
        }
    }

    /// Parses a fixed-precision decimal. The returned value is rounded to
    /// `decimal_places`.
    pub fn decimal_field(
        &mut self,
        name: &str,
        required: bool,
        max_digits: u32,
        decimal_places: u32,
    ) -> Option<Decimal> {
        let value = self.lookup(name, required)?;
        let parsed = match value {
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        };
        let Some(number) = parsed else {
            self.errors.add(name, "A valid number is required.");
            return None;
        };

        if let Err(message) = check_precision(number, max_digits, decimal_places) {
            self.errors.add(name, message);
            return None;
        }
        Some(number.round_dp(decimal_places))
    }

    pub fn list_field(&mut self, name: &str, required: bool) -> Option<&'a Vec<Value>> {
        let value = self.lookup(name, required)?;
        match value {
            Value::Array(items) => Some(items),
            other => {
                self.errors.add(
                    name,
                    format!(
                        "Expected a list of items but got type \"{}\".",
                        json_type_name(other)
                    ),
                );
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Checks the `validator` rules of `input` and returns it if neither
    /// pass found a problem. Fields that failed coercion are `None` and are
    /// skipped by the rules.
    pub fn finish_with<T: Validate>(mut self, input: T) -> Result<T, ValidationErrors> {
        if let Err(rule_errors) = input.validate() {
            self.errors.merge(rule_errors.into());
        }
        self.finish().map(|()| input)
    }
}

fn check_precision(number: Decimal, max_digits: u32, decimal_places: u32) -> Result<(), String> {
    let normalized = number.normalize();
    let scale = normalized.scale();
    let digits = normalized.mantissa().unsigned_abs().to_string().len() as u32;
    let total_digits = digits.max(scale);
    let whole_digits = digits.saturating_sub(scale);
    let max_whole_digits = max_digits - decimal_places;

    if total_digits > max_digits {
        Err(format!(
            "Ensure that there are no more than {max_digits} digits in total."
        ))
    } else if scale > decimal_places {
        Err(format!(
            "Ensure that there are no more than {decimal_places} decimal places."
        ))
    } else if whole_digits > max_whole_digits {
        Err(format!(
            "Ensure that there are no more than {max_whole_digits} digits before the decimal point."
        ))
    } else {
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(max = 3, message = "Ensure this field has no more than 3 characters."))]
        code: Option<String>,
        #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
        count: Option<i32>,
    }

    #[test]
    fn test_missing_required_field() {
        let data = json!({});
        let mut reader = FieldReader::new(&data, false).unwrap();
        assert_eq!(reader.char_field("title", CharField::required()), None);
        let errors = reader.finish().unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["This field is required."]);
    }

    #[test]
    fn test_partial_skips_missing_fields() {
        let data = json!({});
        let mut reader = FieldReader::new(&data, true).unwrap();
        assert_eq!(reader.char_field("title", CharField::required()), None);
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_char_field_trims_and_rejects_blank() {
        let data = json!({ "a": "  hi  ", "b": "   ", "c": "  " });
        let mut reader = FieldReader::new(&data, false).unwrap();
        assert_eq!(reader.char_field("a", CharField::required()), Some("hi".to_string()));
        assert_eq!(reader.char_field("b", CharField::required()), None);
        assert_eq!(reader.char_field("c", CharField::optional()), Some(String::new()));
        let errors = reader.finish().unwrap_err();
        assert_eq!(errors.get("b").unwrap(), ["This field may not be blank."]);
        assert_eq!(errors.get("c"), None);
    }

    #[test]
    fn test_null_is_rejected() {
        let data = json!({ "link": null });
        let mut reader = FieldReader::new(&data, true).unwrap();
        assert_eq!(reader.char_field("link", CharField::optional()), None);
        let errors = reader.finish().unwrap_err();
        assert_eq!(errors.get("link").unwrap(), ["This field may not be null."]);
    }

    #[test]
    fn test_integer_field() {
        let data = json!({
            "a": 30,
            "b": "45",
            "c": "abc",
            "d": 2.5,
            "e": 99999999999i64,
            "f": 10.0,
        });
        let mut reader = FieldReader::new(&data, false).unwrap();
        assert_eq!(reader.integer_field("a", true), Some(30));
        assert_eq!(reader.integer_field("b", true), Some(45));
        assert_eq!(reader.integer_field("c", true), None);
        assert_eq!(reader.integer_field("d", true), None);
        assert_eq!(reader.integer_field("e", true), None);
        assert_eq!(reader.integer_field("f", true), Some(10));
        let errors = reader.finish().unwrap_err();
        assert_eq!(errors.get("c").unwrap(), ["A valid integer is required."]);
        assert_eq!(
            errors.get("e").unwrap(),
            ["Ensure this value is less than or equal to 2147483647."]
        );
    }

    #[test]
    fn test_finish_with_merges_rule_errors() {
        let data = json!({ "code": "abcd", "count": -1, "other": "   " });
        let mut reader = FieldReader::new(&data, false).unwrap();
        let code = reader.char_field("code", CharField::optional());
        let count = reader.integer_field("count", false);
        reader.char_field("other", CharField::required());

        let errors = reader.finish_with(Sample { code, count }).unwrap_err();
        assert_eq!(
            errors.get("code").unwrap(),
            ["Ensure this field has no more than 3 characters."]
        );
        assert_eq!(
            errors.get("count").unwrap(),
            ["Ensure this value is greater than or equal to 0."]
        );
        assert_eq!(errors.get("other").unwrap(), ["This field may not be blank."]);
    }

    #[test]
    fn test_finish_with_skips_missing_fields() {
        let data = json!({});
        let reader = FieldReader::new(&data, true).unwrap();
        let sample = reader
            .finish_with(Sample { code: None, count: None })
            .unwrap();
        assert!(sample.code.is_none());
    }

    #[test]
    fn test_decimal_field_precision() {
        let data = json!({
            "ok": "5.25",
            "num": 5.99,
            "places": "1.234",
            "whole": "1234.5",
            "total": "123456",
            "nan": "cheap",
        });
        let mut reader = FieldReader::new(&data, false).unwrap();
        assert_eq!(
            reader.decimal_field("ok", true, 5, 2),
            Some(Decimal::from_str("5.25").unwrap())
        );
        assert_eq!(
            reader.decimal_field("num", true, 5, 2),
            Some(Decimal::from_str("5.99").unwrap())
        );
        assert_eq!(reader.decimal_field("places", true, 5, 2), None);
        assert_eq!(reader.decimal_field("whole", true, 5, 2), None);
        assert_eq!(reader.decimal_field("total", true, 5, 2), None);
        assert_eq!(reader.decimal_field("nan", true, 5, 2), None);
        let errors = reader.finish().unwrap_err();
        assert_eq!(
            errors.get("places").unwrap(),
            ["Ensure that there are no more than 2 decimal places."]
        );
        assert_eq!(
            errors.get("whole").unwrap(),
            ["Ensure that there are no more than 3 digits before the decimal point."]
        );
        assert_eq!(
            errors.get("total").unwrap(),
            ["Ensure that there are no more than 5 digits in total."]
        );
        assert_eq!(errors.get("nan").unwrap(), ["A valid number is required."]);
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_places() {
        let data = json!({ "price": "2.500" });
        let mut reader = FieldReader::new(&data, false).unwrap();
        assert_eq!(
            reader.decimal_field("price", true, 5, 2),
            Some(Decimal::from_str("2.5").unwrap())
        );
    }

    #[test]
    fn test_non_object_payload() {
        let data = json!(["not", "an", "object"]);
        let errors = FieldReader::new(&data, false).err().unwrap();
        assert_eq!(
            errors.get(NON_FIELD_ERRORS).unwrap(),
            ["Invalid data. Expected a dictionary, but got list."]
        );
    }

    #[test]
    fn test_extend_prefixed() {
        let mut errors = ValidationErrors::default();
        errors.extend_prefixed(
            "tags[1]",
            ValidationErrors::single("name", "This field is required."),
        );
        assert_eq!(
            errors.get("tags[1].name").unwrap(),
            ["This field is required."]
        );
    }
}
