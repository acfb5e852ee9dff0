//! Spec string parsing: `"[provider/]model[:useCase]"`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Providers this crate recognizes, in canonical spelling.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "openai",
    "anthropic",
    "google",
    "ollama",
    "openrouter",
    "vertexai",
    "mock",
];

/// Alternate spellings normalized to a canonical provider name.
const PROVIDER_SYNONYMS: &[(&str, &str)] = &[("gemini", "google")];

/// Bare model names mapped to full spec strings. Checked before prefix
/// inference so curated entries win over heuristics.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("claude-3-opus", "anthropic/claude-3-opus"),
    ("claude-3-sonnet", "anthropic/claude-3-sonnet"),
    ("claude-3-haiku", "anthropic/claude-3-haiku"),
    ("gpt-4o", "openai/gpt-4o"),
    ("gpt-4o-mini", "openai/gpt-4o-mini"),
    ("gemini-pro", "google/gemini-pro"),
    ("llama3", "ollama/llama3"),
];

/// Model-name prefixes/keywords mapped to the provider they imply.
const MODEL_PREFIXES: &[(&str, &str)] = &[
    ("gpt-", "openai"),
    ("o1", "openai"),
    ("o3", "openai"),
    ("text-embedding", "openai"),
    ("claude", "anthropic"),
    ("gemini", "google"),
    ("llama", "ollama"),
    ("mistral", "ollama"),
    ("mixtral", "ollama"),
    ("qwen", "ollama"),
    ("phi", "ollama"),
];

/// Use case selecting a provider factory variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseCase {
    #[default]
    Default,
    Performance,
    Reliability,
    Streaming,
}

impl UseCase {
    /// Canonical lowercase spelling, as written in spec strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::Default => "default",
            UseCase::Performance => "performance",
            UseCase::Reliability => "reliability",
            UseCase::Streaming => "streaming",
        }
    }
}

impl std::str::FromStr for UseCase {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(UseCase::Default),
            "performance" => Ok(UseCase::Performance),
            "reliability" => Ok(UseCase::Reliability),
            "streaming" => Ok(UseCase::Streaming),
            other => Err(ParseError::UnknownUseCase(other.to_string())),
        }
    }
}

/// A parsed provider spec: canonical provider, model, use case.
///
/// `model` may be empty when the input named only a provider
/// (e.g. `"openai"`); callers pick the provider's default model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub use_case: UseCase,
}

impl std::fmt::Display for ProviderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.model.is_empty(), self.use_case) {
            (true, UseCase::Default) => write!(f, "{}", self.provider),
            (true, uc) => write!(f, "{}:{}", self.provider, uc.as_str()),
            (false, UseCase::Default) => write!(f, "{}/{}", self.provider, self.model),
            (false, uc) => write!(f, "{}/{}:{}", self.provider, self.model, uc.as_str()),
        }
    }
}

/// Errors from spec-string parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The string names no known provider and matches no alias or prefix.
    #[error("cannot parse provider spec {0:?}: unknown provider and no model prefix matched")]
    Unparseable(String),
    /// An empty string was given.
    #[error("empty provider spec")]
    Empty,
    /// The `:useCase` suffix is not one of the known use cases.
    #[error("unknown use case: {0} (use default, performance, reliability, or streaming)")]
    UnknownUseCase(String),
}

fn normalize_provider(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    for (synonym, canonical) in PROVIDER_SYNONYMS {
        if lower == *synonym {
            return (*canonical).to_string();
        }
    }
    lower
}

fn is_known_provider(name: &str) -> bool {
    KNOWN_PROVIDERS.contains(&name)
}

fn infer_provider(model: &str) -> Option<&'static str> {
    let lower = model.to_ascii_lowercase();
    MODEL_PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, provider)| *provider)
}

/// Parses `"[provider/]model[:useCase]"` into a [`ProviderSpec`].
///
/// Resolution order for a single-part input: known provider name, alias
/// table (recursing on the alias target), model-prefix inference, then
/// [`ParseError::Unparseable`].
pub fn parse(input: &str) -> Result<ProviderSpec, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    // Split the use-case suffix first; aliases never carry one.
    let (body, use_case) = match input.rsplit_once(':') {
        Some((body, suffix)) if !body.is_empty() => (body, suffix.parse::<UseCase>()?),
        _ => (input, UseCase::Default),
    };

    if let Some((provider, model)) = body.split_once('/') {
        let provider = normalize_provider(provider);
        return Ok(ProviderSpec {
            provider,
            model: model.to_string(),
            use_case,
        });
    }

    let normalized = normalize_provider(body);
    if is_known_provider(&normalized) {
        return Ok(ProviderSpec {
            provider: normalized,
            model: String::new(),
            use_case,
        });
    }

    for (alias, target) in MODEL_ALIASES {
        if body.eq_ignore_ascii_case(alias) {
            let mut spec = parse(target)?;
            spec.use_case = use_case;
            return Ok(spec);
        }
    }

    if let Some(provider) = infer_provider(body) {
        return Ok(ProviderSpec {
            provider: provider.to_string(),
            model: body.to_string(),
            use_case,
        });
    }

    Err(ParseError::Unparseable(input.to_string()))
}
