//! Provider templates: named factories the dynamic registry instantiates.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::metadata::ProviderMetadata;
use super::registry::RegistryError;
use super::Provider;
use crate::schema::Schema;

/// Factory function building a configured provider from a JSON config.
pub type BuildFn = Arc<
    dyn Fn(&Value) -> Result<(Arc<dyn Provider>, ProviderMetadata), RegistryError> + Send + Sync,
>;

/// A named provider factory.
///
/// `field_schema` describes the accepted config object; `env` maps config
/// fields to the environment variables that can fill them when absent
/// (e.g. `api_key` → `OPENAI_API_KEY`). The registry validates and
/// env-fills the config before calling `build`.
#[derive(Clone)]
pub struct ProviderTemplate {
    pub name: String,
    /// Backend type the template produces (e.g. `openai`).
    pub provider_type: String,
    pub description: String,
    pub field_schema: Schema,
    /// Config field → env var that can supply it.
    pub env: HashMap<String, String>,
    /// Example config objects, for documentation surfaces.
    pub examples: Vec<Value>,
    build: BuildFn,
}

impl ProviderTemplate {
    pub fn new(
        name: impl Into<String>,
        provider_type: impl Into<String>,
        field_schema: Schema,
        build: BuildFn,
    ) -> Self {
        Self {
            name: name.into(),
            provider_type: provider_type.into(),
            description: String::new(),
            field_schema,
            env: HashMap::new(),
            examples: Vec::new(),
            build,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declares that `field` may be filled from `env_var` when absent.
    pub fn with_env(mut self, field: impl Into<String>, env_var: impl Into<String>) -> Self {
        self.env.insert(field.into(), env_var.into());
        self
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.examples.push(example);
        self
    }

    /// Builds a provider from an already validated and env-filled config.
    pub fn build(&self, config: &Value) -> Result<(Arc<dyn Provider>, ProviderMetadata), RegistryError> {
        (self.build)(config)
    }
}

impl std::fmt::Debug for ProviderTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTemplate")
            .field("name", &self.name)
            .field("provider_type", &self.provider_type)
            .field("env", &self.env)
            .finish()
    }
}
