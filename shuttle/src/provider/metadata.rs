//! Provider and model metadata for capability queries.

use serde::{Deserialize, Serialize};

/// A capability a provider or model advertises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Streaming,
    Vision,
    FunctionCalling,
    StructuredOutput,
    Embedding,
    Caching,
}

/// Metadata for one model a provider serves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model id as used in API calls (e.g. `gpt-4o-mini`).
    pub id: String,
    /// Display name.
    pub name: String,
    pub context_window: u32,
    pub max_output_tokens: u32,
    /// USD per million input tokens.
    pub input_price_per_m: f64,
    /// USD per million output tokens.
    pub output_price_per_m: f64,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Release date, ISO `YYYY-MM-DD`, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
}

impl ModelMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            context_window: 0,
            max_output_tokens: 0,
            input_price_per_m: 0.0,
            output_price_per_m: 0.0,
            capabilities: Vec::new(),
            released: None,
        }
    }

    pub fn with_limits(mut self, context_window: u32, max_output_tokens: u32) -> Self {
        self.context_window = context_window;
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_pricing(mut self, input_per_m: f64, output_per_m: f64) -> Self {
        self.input_price_per_m = input_per_m;
        self.output_price_per_m = output_per_m;
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_release_date(mut self, released: impl Into<String>) -> Self {
        self.released = Some(released.into());
        self
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Metadata for a registered provider instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Instance name the provider is registered under.
    pub name: String,
    /// Backend type (e.g. `openai`, `mock`).
    pub provider_type: String,
    /// Capabilities the instance supports regardless of model.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Models the instance can serve.
    #[serde(default)]
    pub models: Vec<ModelMetadata>,
}

impl ProviderMetadata {
    pub fn new(name: impl Into<String>, provider_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_type: provider_type.into(),
            capabilities: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_model(mut self, model: ModelMetadata) -> Self {
        self.models.push(model);
        self
    }

    /// Whether the instance or any of its models advertises `capability`.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
            || self.models.iter().any(|m| m.has_capability(capability))
    }
}
