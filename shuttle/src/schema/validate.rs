//! Value validation against a [`Schema`].

use serde_json::Value;
use thiserror::Error;

use super::{Schema, SchemaType};

/// A validation failure, carrying the JSON-pointer-ish path to the
/// offending value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("validation failed at {path}: {message}")]
pub struct ValidationError {
    /// Path to the failing value (`$`, `$.user.age`, `$.items[2]`).
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// The last path segment, when it names an object field.
    ///
    /// Used by tool dispatch to look up per-field error guidance.
    pub fn field(&self) -> Option<&str> {
        let tail = self.path.rsplit('.').next()?;
        if tail == "$" || tail.ends_with(']') {
            None
        } else {
            Some(tail)
        }
    }
}

impl Schema {
    /// Checks `value` against this schema.
    ///
    /// Unknown object properties are allowed; `required` names must be
    /// present; enums match on the value's string form; integer schemas
    /// reject fractional numbers.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        validate_at(self, value, "$")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn validate_at(schema: &Schema, value: &Value, path: &str) -> Result<(), ValidationError> {
    match schema.schema_type {
        SchemaType::Object => {
            let obj = value.as_object().ok_or_else(|| {
                ValidationError::new(path, format!("expected object, got {}", type_name(value)))
            })?;
            for name in &schema.required {
                if !obj.contains_key(name) {
                    return Err(ValidationError::new(
                        &format!("{path}.{name}"),
                        format!("missing required property {name:?}"),
                    ));
                }
            }
            for (name, prop_schema) in &schema.properties {
                if let Some(prop) = obj.get(name) {
                    validate_at(prop_schema, prop, &format!("{path}.{name}"))?;
                }
            }
            Ok(())
        }
        SchemaType::Array => {
            let items = value.as_array().ok_or_else(|| {
                ValidationError::new(path, format!("expected array, got {}", type_name(value)))
            })?;
            if let Some(item_schema) = &schema.items {
                for (i, item) in items.iter().enumerate() {
                    validate_at(item_schema, item, &format!("{path}[{i}]"))?;
                }
            }
            Ok(())
        }
        SchemaType::String => {
            let s = value.as_str().ok_or_else(|| {
                ValidationError::new(path, format!("expected string, got {}", type_name(value)))
            })?;
            check_enum(schema, s, path)
        }
        SchemaType::Integer => {
            let n = value.as_i64().or_else(|| {
                // Accept whole-valued floats the way lenient JSON producers emit them.
                value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)
            });
            let n = n.ok_or_else(|| {
                ValidationError::new(path, format!("expected integer, got {}", type_name(value)))
            })?;
            check_bounds(schema, n as f64, path)?;
            check_enum(schema, &n.to_string(), path)
        }
        SchemaType::Number => {
            let n = value.as_f64().ok_or_else(|| {
                ValidationError::new(path, format!("expected number, got {}", type_name(value)))
            })?;
            check_bounds(schema, n, path)
        }
        SchemaType::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(ValidationError::new(
                    path,
                    format!("expected boolean, got {}", type_name(value)),
                ))
            }
        }
        SchemaType::Null => {
            if value.is_null() {
                Ok(())
            } else {
                Err(ValidationError::new(
                    path,
                    format!("expected null, got {}", type_name(value)),
                ))
            }
        }
    }
}

fn check_bounds(schema: &Schema, n: f64, path: &str) -> Result<(), ValidationError> {
    if let Some(min) = schema.minimum {
        if n < min {
            return Err(ValidationError::new(path, format!("{n} is below minimum {min}")));
        }
    }
    if let Some(max) = schema.maximum {
        if n > max {
            return Err(ValidationError::new(path, format!("{n} is above maximum {max}")));
        }
    }
    Ok(())
}

fn check_enum(schema: &Schema, spelled: &str, path: &str) -> Result<(), ValidationError> {
    if schema.enum_values.is_empty() || schema.enum_values.iter().any(|v| v == spelled) {
        Ok(())
    } else {
        Err(ValidationError::new(
            path,
            format!("{spelled:?} is not one of {:?}", schema.enum_values),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> Schema {
        Schema::object()
            .property("name", Schema::string())
            .property("age", Schema::integer().minimum(0.0))
            .required(["name", "age"])
    }

    /// **Scenario**: A conforming object passes; extra properties are allowed.
    #[test]
    fn valid_object_passes() {
        let v = json!({"name": "Alice", "age": 30, "extra": true});
        assert!(person().validate(&v).is_ok());
    }

    /// **Scenario**: A missing required property fails, and the error names the field.
    #[test]
    fn missing_required_property_fails_with_field() {
        let err = person().validate(&json!({"name": "Alice"})).unwrap_err();
        assert_eq!(err.field(), Some("age"));
        assert!(err.message.contains("required"));
    }

    /// **Scenario**: Numeric bounds and integer-ness are enforced.
    #[test]
    fn bounds_and_integerness() {
        let err = person().validate(&json!({"name": "A", "age": -1})).unwrap_err();
        assert!(err.message.contains("minimum"));
        let err = person().validate(&json!({"name": "A", "age": 1.5})).unwrap_err();
        assert!(err.message.contains("integer"));
        // Whole-valued floats are accepted as integers.
        assert!(person().validate(&json!({"name": "A", "age": 2.0})).is_ok());
    }

    /// **Scenario**: Enum membership is checked on string values.
    #[test]
    fn enum_membership() {
        let schema = Schema::string().one_of(["red", "blue"]);
        assert!(schema.validate(&json!("red")).is_ok());
        let err = schema.validate(&json!("green")).unwrap_err();
        assert!(err.message.contains("not one of"));
    }

    /// **Scenario**: Array items are validated with indexed paths.
    #[test]
    fn array_item_paths() {
        let schema = Schema::array(Schema::integer());
        let err = schema.validate(&json!([1, "two", 3])).unwrap_err();
        assert_eq!(err.path, "$[1]");
        assert_eq!(err.field(), None);
    }
}
