//! Per-call provider options.
//!
//! Options are provider-agnostic where possible (temperature, max tokens,
//! stop sequences, timeout, retry) with named slots for the
//! provider-specific settings the recognized backends accept. Builder
//! methods apply in call order, so a later setting overrides an earlier
//! one.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use super::retry::RetryPolicy;
use crate::tool::ToolDescriptor;

/// Configuration for one provider call.
#[derive(Clone, Debug, Default)]
pub struct ProviderOptions {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stop_sequences: Vec<String>,
    /// Overall deadline for the call; retry never exceeds it.
    pub timeout: Option<Duration>,
    /// Retry policy for transient failures; `None` disables retries.
    pub retry: Option<RetryPolicy>,
    /// Extra HTTP headers, applied in insertion order.
    pub headers: Vec<(String, String)>,
    pub base_url: Option<String>,
    /// OpenAI organization id.
    pub organization: Option<String>,
    /// Anthropic top-level system prompt.
    pub system_prompt: Option<String>,
    /// Gemini generation config, passed through opaquely.
    pub generation_config: Option<Value>,
    /// Gemini safety settings, passed through opaquely.
    pub safety_settings: Option<Value>,
    /// Escape hatch for anything else a backend understands.
    pub extra: HashMap<String, Value>,
    /// Tools offered to the model for this call; backends translate these
    /// into their function-calling wire shape.
    pub tools: Vec<ToolDescriptor>,
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.push(stop.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_generation_config(mut self, config: Value) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn with_safety_settings(mut self, settings: Value) -> Self {
        self.safety_settings = Some(settings);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    /// Overlays `other` on top of `self`: set fields in `other` win,
    /// stop sequences and headers append, extras merge key-wise.
    pub fn merged_with(mut self, other: &ProviderOptions) -> Self {
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.top_p.is_some() {
            self.top_p = other.top_p;
        }
        if other.max_tokens.is_some() {
            self.max_tokens = other.max_tokens;
        }
        self.stop_sequences.extend(other.stop_sequences.iter().cloned());
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.retry.is_some() {
            self.retry = other.retry.clone();
        }
        self.headers.extend(other.headers.iter().cloned());
        if other.base_url.is_some() {
            self.base_url = other.base_url.clone();
        }
        if other.organization.is_some() {
            self.organization = other.organization.clone();
        }
        if other.system_prompt.is_some() {
            self.system_prompt = other.system_prompt.clone();
        }
        if other.generation_config.is_some() {
            self.generation_config = other.generation_config.clone();
        }
        if other.safety_settings.is_some() {
            self.safety_settings = other.safety_settings.clone();
        }
        for (k, v) in &other.extra {
            self.extra.insert(k.clone(), v.clone());
        }
        if !other.tools.is_empty() {
            self.tools = other.tools.clone();
        }
        self
    }
}
