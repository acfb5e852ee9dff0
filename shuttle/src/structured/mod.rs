//! Structured output: schema-guided prompt enhancement and robust JSON
//! extraction from free-text model replies.
//!
//! [`enhance_prompt`] augments a user prompt with the target schema and the
//! instructions a model needs to answer in valid JSON; [`extract_json`]
//! recovers the first well-formed JSON value from whatever the model wrote
//! around it. [`parse_structured`] combines extraction with schema
//! validation, which is what [`Provider::generate_with_schema`]
//! (crate::provider::Provider::generate_with_schema) runs.

mod cache;
mod extract;
mod pool;

pub use cache::schema_json;
pub use extract::extract_json;

use serde_json::Value;

use crate::schema::{Schema, SchemaType};

/// Augments `prompt` for schema-conforming JSON output.
///
/// The result contains, in order: the original prompt verbatim, the
/// valid-JSON-only instruction, the schema in a fenced block, the required
/// fields, per-field descriptions with enum constraints, and the item type
/// for array schemas.
pub fn enhance_prompt(prompt: &str, schema: &Schema) -> String {
    let schema_block = schema_json(schema);
    pool::with_buffer(|out| {
        out.push_str(prompt);
        out.push_str("\n\n");
        out.push_str(
            "Your response MUST be valid JSON only. Do not wrap it in markdown or add any text outside the JSON value.\n\n",
        );
        out.push_str("The response must conform to this JSON schema:\n```json\n");
        out.push_str(&schema_block);
        out.push_str("\n```\n");

        if !schema.required.is_empty() {
            out.push_str("\nRequired fields: ");
            out.push_str(&schema.required.join(", "));
            out.push('\n');
        }

        let described: Vec<(&String, &Schema)> = schema
            .properties
            .iter()
            .filter(|(_, s)| s.description.is_some() || !s.enum_values.is_empty())
            .collect();
        if !described.is_empty() {
            out.push_str("\nField notes:\n");
            for (name, field) in described {
                out.push_str("- ");
                out.push_str(name);
                out.push_str(" (");
                out.push_str(field.schema_type.as_str());
                out.push(')');
                if let Some(desc) = &field.description {
                    out.push_str(": ");
                    out.push_str(desc);
                }
                if !field.enum_values.is_empty() {
                    out.push_str(" [one of: ");
                    out.push_str(&field.enum_values.join(", "));
                    out.push(']');
                }
                out.push('\n');
            }
        }

        if schema.schema_type == SchemaType::Array {
            if let Some(items) = &schema.items {
                out.push_str("\nRespond with a JSON array; each item must be of type ");
                out.push_str(items.schema_type.as_str());
                out.push_str(".\n");
            }
        }
    })
}

/// Builds the one-shot repair prompt used after an unusable reply.
pub fn repair_prompt(enhanced_prompt: &str, bad_reply: &str, reason: &str) -> String {
    pool::with_buffer(|out| {
        out.push_str(enhanced_prompt);
        out.push_str("\n\nYour previous response could not be used: ");
        out.push_str(reason);
        out.push_str("\nPrevious response:\n");
        out.push_str(bad_reply);
        out.push_str("\nRespond again with valid JSON only.");
    })
}

/// Extracts the first JSON value from `text` and validates it against
/// `schema`. On failure, returns a human-readable reason suitable for a
/// repair prompt.
pub fn parse_structured(text: &str, schema: &Schema) -> Result<Value, String> {
    let raw = extract_json(text).ok_or_else(|| "no JSON value found in the response".to_string())?;
    let value: Value =
        serde_json::from_str(&raw).map_err(|e| format!("extracted JSON did not parse: {e}"))?;
    schema.validate(&value).map_err(|e| e.to_string())?;
    Ok(value)
}
