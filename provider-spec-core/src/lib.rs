//! Provider spec strings: parse `"provider/model[:useCase]"` and resolve
//! the environment variables a provider reads at build time.
//!
//! A spec string names a backend plus a model, optionally tagged with a use
//! case that selects a factory variant:
//!
//! ```
//! use provider_spec_core::{parse, UseCase};
//!
//! let spec = parse("anthropic/claude-3-sonnet:streaming").unwrap();
//! assert_eq!(spec.provider, "anthropic");
//! assert_eq!(spec.model, "claude-3-sonnet");
//! assert_eq!(spec.use_case, UseCase::Streaming);
//! ```
//!
//! Bare model names go through a static alias table first, then a
//! prefix/keyword inference table (`gpt-*` → openai, `claude*` → anthropic,
//! …). Provider names are normalized (`gemini` → `google`).

mod env;
mod spec;

pub use env::{api_key_env_vars, host_env_var, lookup_api_key, use_case_env_var, DEFAULT_OLLAMA_HOST};
pub use spec::{parse, ParseError, ProviderSpec, UseCase, KNOWN_PROVIDERS};
