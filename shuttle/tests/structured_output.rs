//! Structured-output pipeline through the provider trait.

use std::sync::Arc;

use serde_json::json;

use shuttle::provider::{MockProvider, Provider, ProviderOptions};
use shuttle::run_context::RunContext;
use shuttle::schema::Schema;
use shuttle::structured::{enhance_prompt, extract_json};

fn person_schema() -> Schema {
    Schema::object()
        .property("name", Schema::string())
        .property("age", Schema::integer().minimum(0.0))
        .required(["name", "age"])
}

/// **Scenario**: A fenced reply yields the validated structured value.
#[tokio::test]
async fn structured_value_from_fenced_reply() {
    let provider = Arc::new(
        MockProvider::new()
            .reply_text("Here you go: ```json\n{\"name\":\"Alice\",\"age\":30}\n```"),
    );
    let value = provider
        .generate_with_schema(
            &RunContext::new(),
            "Alice is 30",
            &person_schema(),
            &ProviderOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(value, json!({"name": "Alice", "age": 30}));

    // The provider saw the enhanced prompt, original text included.
    let sent = provider.requests()[0][0].content_text();
    assert!(sent.starts_with("Alice is 30"));
    assert!(sent.contains("MUST be valid JSON"));
    assert!(sent.contains("```json"));
}

/// **Scenario**: A first junk reply triggers one repair turn; the repaired
/// reply is accepted.
#[tokio::test]
async fn repair_retry_recovers() {
    let provider = Arc::new(
        MockProvider::new()
            .reply_text("I think the answer is forty-two.")
            .reply_text("{\"name\":\"Bob\",\"age\":42}"),
    );
    let value = provider
        .generate_with_schema(
            &RunContext::new(),
            "Bob is 42",
            &person_schema(),
            &ProviderOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(value["name"], "Bob");
    assert_eq!(provider.call_count(), 2);

    let repair = provider.requests()[1][0].content_text();
    assert!(repair.contains("could not be used"));
}

/// **Scenario**: A schema-violating value fails after the single repair.
#[tokio::test]
async fn schema_violation_surfaces() {
    let provider = Arc::new(
        MockProvider::new()
            .reply_text("{\"name\":\"Carol\"}")
            .reply_text("{\"name\":\"Carol\"}"),
    );
    let err = provider
        .generate_with_schema(
            &RunContext::new(),
            "Carol",
            &person_schema(),
            &ProviderOptions::new(),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("age"), "{err}");
    assert_eq!(provider.call_count(), 2);
}

/// **Scenario**: Enhancement composes with extraction — the schema block
/// inside an enhanced prompt is itself extractable JSON.
#[test]
fn enhancement_and_extraction_compose() {
    let enhanced = enhance_prompt("Describe Alice", &person_schema());
    let embedded = extract_json(&enhanced).expect("schema block extractable");
    let parsed: serde_json::Value = serde_json::from_str(&embedded).unwrap();
    assert_eq!(parsed["type"], "object");
    assert!(parsed["properties"]["age"].is_object());
}
