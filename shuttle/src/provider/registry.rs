//! Dynamic provider registry: templates, configured instances, and
//! capability/price queries over model metadata.
//!
//! Templates are named factories; `create_from_template` validates the
//! caller's config against the template's field schema, fills missing
//! fields from the environment (loading `.env` first), builds the
//! provider, and registers it. Registration semantics match the tool
//! registry: idempotent for the identical instance, conflict otherwise.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::metadata::{Capability, ModelMetadata, ProviderMetadata};
use super::template::ProviderTemplate;
use super::Provider;
use crate::schema::ValidationError;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("provider not found: {0}")]
    ProviderNotFound(String),
    #[error("name already registered with a different entry: {0}")]
    Conflict(String),
    #[error("invalid provider config: {0}")]
    InvalidConfig(#[from] ValidationError),
    /// Names both accepted env-var spellings so operators can fix either.
    #[error("missing API key for {provider}: set {standard} (or {fallback})")]
    MissingApiKey {
        provider: String,
        standard: String,
        fallback: String,
    },
    #[error("provider build failed: {0}")]
    Build(String),
    #[error("no registered model satisfies the constraints")]
    NoSatisfyingModel,
}

/// Constraints for [`ProviderRegistry::create_with_best_model`].
#[derive(Clone, Debug, Default)]
pub struct BestModelQuery {
    pub min_context: Option<u32>,
    pub max_input_price_per_m: Option<f64>,
    pub capabilities: Vec<Capability>,
}

impl BestModelQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_context(mut self, tokens: u32) -> Self {
        self.min_context = Some(tokens);
        self
    }

    pub fn max_input_price_per_m(mut self, price: f64) -> Self {
        self.max_input_price_per_m = Some(price);
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }
}

/// One instantiated template, remembered for export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub name: String,
    pub template: String,
    pub config: Value,
}

/// Serializable registry state: the template instantiations needed to
/// rebuild every configured provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub instances: Vec<InstanceRecord>,
}

struct Registered {
    provider: Arc<dyn Provider>,
    metadata: ProviderMetadata,
}

/// Registry of provider templates and configured instances.
///
/// Maps are guarded by reader-writer locks: lookups are hot, registration
/// is rare.
#[derive(Default)]
pub struct ProviderRegistry {
    templates: RwLock<HashMap<String, ProviderTemplate>>,
    providers: RwLock<HashMap<String, Registered>>,
    instances: RwLock<Vec<InstanceRecord>>,
}

static LOAD_DOTENV: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template; a second template under the same name fails
    /// with [`RegistryError::Conflict`].
    pub fn register_template(&self, template: ProviderTemplate) -> Result<(), RegistryError> {
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        if templates.contains_key(&template.name) {
            return Err(RegistryError::Conflict(template.name));
        }
        templates.insert(template.name.clone(), template);
        Ok(())
    }

    /// All registered templates.
    pub fn list_templates(&self) -> Vec<ProviderTemplate> {
        self.templates
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    /// Instantiates `template_name` as `instance_name`.
    ///
    /// Missing config fields with env hints are filled from the
    /// environment (after loading `.env`); a still-missing `api_key` field
    /// produces [`RegistryError::MissingApiKey`] naming both accepted
    /// spellings. The filled config is validated against the template's
    /// field schema before the factory runs.
    pub fn create_from_template(
        &self,
        template_name: &str,
        instance_name: &str,
        config: Value,
    ) -> Result<Arc<dyn Provider>, RegistryError> {
        let template = {
            let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
            templates
                .get(template_name)
                .cloned()
                .ok_or_else(|| RegistryError::TemplateNotFound(template_name.to_string()))?
        };

        let config = self.fill_from_env(&template, config)?;
        template.field_schema.validate(&config)?;

        let (provider, mut metadata) = template.build(&config)?;
        metadata.name = instance_name.to_string();
        if metadata.provider_type.is_empty() {
            metadata.provider_type = template.provider_type.clone();
        }
        debug!(template = %template.name, instance = %instance_name, "provider instantiated");

        self.register_provider(instance_name, Arc::clone(&provider), metadata)?;
        self.instances
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(InstanceRecord {
                name: instance_name.to_string(),
                template: template_name.to_string(),
                config,
            });
        Ok(provider)
    }

    fn fill_from_env(
        &self,
        template: &ProviderTemplate,
        mut config: Value,
    ) -> Result<Value, RegistryError> {
        Lazy::force(&LOAD_DOTENV);
        let obj = match config.as_object_mut() {
            Some(obj) => obj,
            None => return Ok(config),
        };
        for (field, env_var) in &template.env {
            if obj.get(field).map_or(false, |v| !v.is_null()) {
                continue;
            }
            let mut value = std::env::var(env_var).ok().filter(|v| !v.is_empty());
            if value.is_none() && field == "api_key" {
                value = provider_spec_core::lookup_api_key(&template.provider_type);
            }
            match value {
                Some(value) => {
                    obj.insert(field.clone(), Value::String(value));
                }
                None if field == "api_key"
                    && template.field_schema.required.iter().any(|r| r == field) =>
                {
                    let (standard, fallback) =
                        provider_spec_core::api_key_env_vars(&template.provider_type);
                    return Err(RegistryError::MissingApiKey {
                        provider: template.provider_type.clone(),
                        standard,
                        fallback,
                    });
                }
                None => {}
            }
        }
        Ok(config)
    }

    /// Registers an already built provider under `name`.
    ///
    /// Re-registering the identical instance is a no-op; a different
    /// instance under an existing name fails with
    /// [`RegistryError::Conflict`].
    pub fn register_provider(
        &self,
        name: &str,
        provider: Arc<dyn Provider>,
        metadata: ProviderMetadata,
    ) -> Result<(), RegistryError> {
        let mut providers = self.providers.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = providers.get(name) {
            if Arc::ptr_eq(&existing.provider, &provider) {
                return Ok(());
            }
            return Err(RegistryError::Conflict(name.to_string()));
        }
        providers.insert(
            name.to_string(),
            Registered { provider, metadata },
        );
        Ok(())
    }

    pub fn get_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .map(|r| Arc::clone(&r.provider))
    }

    pub fn get_metadata(&self, name: &str) -> Option<ProviderMetadata> {
        self.providers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .map(|r| r.metadata.clone())
    }

    /// Names of all registered providers, unsorted.
    pub fn list_providers(&self) -> Vec<String> {
        self.providers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Names of providers advertising `capability` (directly or via a model).
    pub fn list_providers_by_capability(&self, capability: Capability) -> Vec<String> {
        self.providers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(_, r)| r.metadata.has_capability(capability))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Finds the cheapest provider/model satisfying every constraint and
    /// returns the provider with the chosen model's metadata.
    ///
    /// "Cheapest" orders by input price, then output price.
    pub fn create_with_best_model(
        &self,
        query: &BestModelQuery,
    ) -> Result<(Arc<dyn Provider>, ModelMetadata), RegistryError> {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        let mut best: Option<(&Registered, &ModelMetadata)> = None;
        for registered in providers.values() {
            for model in &registered.metadata.models {
                if let Some(min) = query.min_context {
                    if model.context_window < min {
                        continue;
                    }
                }
                if let Some(max) = query.max_input_price_per_m {
                    if model.input_price_per_m > max {
                        continue;
                    }
                }
                let caps_ok = query.capabilities.iter().all(|c| {
                    model.has_capability(*c) || registered.metadata.capabilities.contains(c)
                });
                if !caps_ok {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((_, current)) => {
                        (model.input_price_per_m, model.output_price_per_m)
                            < (current.input_price_per_m, current.output_price_per_m)
                    }
                };
                if better {
                    best = Some((registered, model));
                }
            }
        }
        best.map(|(r, m)| (Arc::clone(&r.provider), m.clone()))
            .ok_or(RegistryError::NoSatisfyingModel)
    }

    /// Serializes the template instantiations made so far.
    pub fn export_config(&self) -> RegistryConfig {
        RegistryConfig {
            instances: self
                .instances
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }

    /// Rebuilds every instance in `config` through the registered
    /// templates. Stops at the first failure.
    pub fn import_config(&self, config: &RegistryConfig) -> Result<(), RegistryError> {
        for instance in &config.instances {
            self.create_from_template(&instance.template, &instance.name, instance.config.clone())?;
        }
        Ok(())
    }
}
