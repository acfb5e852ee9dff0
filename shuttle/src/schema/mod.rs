//! Schema types for tool parameters and structured output.
//!
//! A [`Schema`] describes the shape a JSON value must take: scalar type,
//! object properties with required fields, array items, enum membership,
//! and numeric bounds. Tools declare their parameter and output shapes with
//! it; the structured-output pipeline embeds it into prompts; the validator
//! rejects values before they reach tool code.
//!
//! # Example
//!
//! ```
//! use shuttle::schema::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::object()
//!     .property("msg", Schema::string().description("Message to echo"))
//!     .required(["msg"]);
//!
//! assert!(schema.validate(&json!({"msg": "hi"})).is_ok());
//! assert!(schema.validate(&json!({})).is_err());
//! ```

mod validate;

pub use validate::ValidationError;

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// JSON value type a schema accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl SchemaType {
    /// Lowercase JSON-Schema spelling, used in messages and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
        }
    }
}

/// Shape description for a JSON value.
///
/// Serializes with JSON-Schema field names (`type`, `enum`, …) so the
/// structured-output pipeline can embed it directly into prompts.
/// Properties use a `BTreeMap` so the serialized form is stable, which the
/// schema-JSON cache and prompt tests rely on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Allowed values, as their canonical string spelling.
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl Schema {
    fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            items: None,
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
        }
    }

    /// An object schema with no properties yet.
    pub fn object() -> Self {
        Self::new(SchemaType::Object)
    }

    /// An array schema; set the item shape with [`Schema::items`].
    pub fn array(items: Schema) -> Self {
        let mut s = Self::new(SchemaType::Array);
        s.items = Some(Box::new(items));
        s
    }

    pub fn string() -> Self {
        Self::new(SchemaType::String)
    }

    pub fn integer() -> Self {
        Self::new(SchemaType::Integer)
    }

    pub fn number() -> Self {
        Self::new(SchemaType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaType::Boolean)
    }

    /// Sets the human-readable description, shown to the model in
    /// enhanced prompts.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an object property.
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Marks property names as required.
    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Restricts a value to a fixed set (serialized as JSON-Schema `enum`).
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the inclusive lower bound for numeric values.
    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    /// Sets the inclusive upper bound for numeric values.
    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }
}

// Hash is manual because of the f64 bounds; bit-patterns are stable for
// the fingerprint the schema-JSON cache needs.
impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema_type.hash(state);
        self.description.hash(state);
        for (name, schema) in &self.properties {
            name.hash(state);
            schema.hash(state);
        }
        self.required.hash(state);
        self.items.hash(state);
        self.enum_values.hash(state);
        self.minimum.map(f64::to_bits).hash(state);
        self.maximum.map(f64::to_bits).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Serialized form uses JSON-Schema field names and omits empty fields.
    #[test]
    fn schema_serializes_with_json_schema_names() {
        let schema = Schema::object()
            .property("age", Schema::integer().minimum(0.0))
            .property("color", Schema::string().one_of(["red", "blue"]))
            .required(["age"]);
        let json = serde_json::to_value(&schema).expect("serialize");
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["age"]["type"], "integer");
        assert_eq!(json["properties"]["age"]["minimum"], 0.0);
        assert_eq!(json["properties"]["color"]["enum"][1], "blue");
        assert!(json.get("items").is_none());
    }

    /// **Scenario**: Schema round-trips through serde.
    #[test]
    fn schema_roundtrip() {
        let schema = Schema::array(Schema::object().property("id", Schema::string()));
        let s = serde_json::to_string(&schema).expect("serialize");
        let back: Schema = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(schema, back);
    }

    /// **Scenario**: Equal schemas hash equal; a changed bound changes the fingerprint.
    #[test]
    fn schema_hash_tracks_structure() {
        use std::collections::hash_map::DefaultHasher;
        fn fingerprint(s: &Schema) -> u64 {
            let mut h = DefaultHasher::new();
            s.hash(&mut h);
            h.finish()
        }
        let a = Schema::object().property("n", Schema::number().minimum(1.0));
        let b = Schema::object().property("n", Schema::number().minimum(1.0));
        let c = Schema::object().property("n", Schema::number().minimum(2.0));
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }
}
