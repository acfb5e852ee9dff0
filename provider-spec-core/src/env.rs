//! Environment variable names read at provider build time.

/// Default Ollama server address when `OLLAMA_HOST` is unset.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Returns the env var names holding the API key for `provider`:
/// `(standard, fallback)`, e.g. `("OPENAI_API_KEY", "SHUTTLE_OPENAI_API_KEY")`.
///
/// Missing-key errors should name both so operators see every accepted
/// spelling.
pub fn api_key_env_vars(provider: &str) -> (String, String) {
    let upper = provider.to_ascii_uppercase().replace('-', "_");
    (format!("{upper}_API_KEY"), format!("SHUTTLE_{upper}_API_KEY"))
}

/// Env var selecting the factory use case for `provider`
/// (e.g. `OPENAI_USE_CASE=streaming`).
pub fn use_case_env_var(provider: &str) -> String {
    format!("{}_USE_CASE", provider.to_ascii_uppercase().replace('-', "_"))
}

/// Env var naming the server host for `provider`, when it has one
/// (currently only `ollama`).
pub fn host_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "ollama" => Some("OLLAMA_HOST"),
        _ => None,
    }
}

/// Reads the API key for `provider`, checking the standard name first and
/// the `SHUTTLE_`-prefixed fallback second. Empty values count as unset.
pub fn lookup_api_key(provider: &str) -> Option<String> {
    let (standard, fallback) = api_key_env_vars(provider);
    for name in [standard, fallback] {
        if let Ok(value) = std::env::var(&name) {
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}
