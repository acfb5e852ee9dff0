//! Built-in guardrails.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Guardrail, GuardrailError, GuardrailKind};
use crate::run_context::RunContext;
use crate::state::State;

/// Rejects states missing any of the listed value keys.
pub struct RequiredKeys {
    keys: Vec<String>,
}

impl RequiredKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Guardrail for RequiredKeys {
    fn name(&self) -> &str {
        "required-keys"
    }

    fn kind(&self) -> GuardrailKind {
        GuardrailKind::Input
    }

    async fn validate(&self, _ctx: &RunContext, state: &State) -> Result<(), GuardrailError> {
        for key in &self.keys {
            if !state.has(key) {
                return Err(GuardrailError::rejected(
                    self.name(),
                    format!("missing required key {key:?}"),
                ));
            }
        }
        Ok(())
    }
}

/// Rejects states whose serialized size exceeds a byte budget.
pub struct MaxStateSize {
    max_bytes: usize,
}

impl MaxStateSize {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl Guardrail for MaxStateSize {
    fn name(&self) -> &str {
        "max-state-size"
    }

    async fn validate(&self, _ctx: &RunContext, state: &State) -> Result<(), GuardrailError> {
        let size = serde_json::to_vec(state)
            .map(|v| v.len())
            .map_err(|e| GuardrailError::rejected(self.name(), format!("state not serializable: {e}")))?;
        if size > self.max_bytes {
            return Err(GuardrailError::rejected(
                self.name(),
                format!("state is {size} bytes, budget is {}", self.max_bytes),
            ));
        }
        Ok(())
    }
}

fn text_of(state: &State) -> String {
    let mut out = String::new();
    for message in state.messages() {
        out.push_str(&message.content_text());
        out.push('\n');
    }
    for (_, value) in state.values() {
        if let Some(s) = value.as_str() {
            out.push_str(s);
            out.push('\n');
        }
    }
    out
}

/// Content moderation by blocklisted terms (case-insensitive).
pub struct Blocklist {
    terms: Vec<String>,
}

impl Blocklist {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(|t| t.into().to_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl Guardrail for Blocklist {
    fn name(&self) -> &str {
        "blocklist"
    }

    async fn validate(&self, _ctx: &RunContext, state: &State) -> Result<(), GuardrailError> {
        let text = text_of(state).to_lowercase();
        for term in &self.terms {
            if text.contains(term) {
                return Err(GuardrailError::rejected(
                    self.name(),
                    format!("blocked term {term:?} present"),
                ));
            }
        }
        Ok(())
    }
}

/// Rejects states whose text matches any of the given regexes.
pub struct RegexFilter {
    patterns: Vec<Regex>,
}

impl RegexFilter {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    /// Compiles the given pattern strings, failing on the first bad one.
    pub fn compile<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

#[async_trait]
impl Guardrail for RegexFilter {
    fn name(&self) -> &str {
        "regex-filter"
    }

    async fn validate(&self, _ctx: &RunContext, state: &State) -> Result<(), GuardrailError> {
        let text = text_of(state);
        for pattern in &self.patterns {
            if pattern.is_match(&text) {
                return Err(GuardrailError::rejected(
                    self.name(),
                    format!("text matches forbidden pattern {:?}", pattern.as_str()),
                ));
            }
        }
        Ok(())
    }
}

static PII_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "email",
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex"),
        ),
        (
            "phone",
            Regex::new(r"\+?\d[\d\s().-]{7,}\d").expect("phone regex"),
        ),
        (
            "ssn",
            Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn regex"),
        ),
    ]
});

/// Detects common PII shapes (email, phone, SSN) in state text.
#[derive(Default)]
pub struct PiiDetector;

impl PiiDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Guardrail for PiiDetector {
    fn name(&self) -> &str {
        "pii-detection"
    }

    async fn validate(&self, _ctx: &RunContext, state: &State) -> Result<(), GuardrailError> {
        let text = text_of(state);
        for (label, pattern) in PII_PATTERNS.iter() {
            if pattern.is_match(&text) {
                return Err(GuardrailError::rejected(
                    self.name(),
                    format!("possible {label} detected"),
                ));
            }
        }
        Ok(())
    }
}

/// Keyword-based topic restriction: denied terms always reject; when an
/// allowed list is present, at least one allowed term must appear.
pub struct TopicRestriction {
    allowed: Vec<String>,
    denied: Vec<String>,
}

impl TopicRestriction {
    pub fn new<I, J, S>(allowed: I, denied: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(|s| s.into().to_lowercase()).collect(),
            denied: denied.into_iter().map(|s| s.into().to_lowercase()).collect(),
        }
    }

    pub fn deny_only<I, S>(denied: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Vec::new(),
            denied: denied.into_iter().map(|s| s.into().to_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl Guardrail for TopicRestriction {
    fn name(&self) -> &str {
        "topic-restriction"
    }

    async fn validate(&self, _ctx: &RunContext, state: &State) -> Result<(), GuardrailError> {
        let text = text_of(state).to_lowercase();
        for term in &self.denied {
            if text.contains(term) {
                return Err(GuardrailError::rejected(
                    self.name(),
                    format!("denied topic {term:?}"),
                ));
            }
        }
        if !self.allowed.is_empty() && !self.allowed.iter().any(|t| text.contains(t)) {
            return Err(GuardrailError::rejected(
                self.name(),
                "no allowed topic present",
            ));
        }
        Ok(())
    }
}

/// Sliding-window rate limit over guardrail invocations.
pub struct RateLimit {
    max_calls: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimit {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl Guardrail for RateLimit {
    fn name(&self) -> &str {
        "rate-limit"
    }

    fn kind(&self) -> GuardrailKind {
        GuardrailKind::Input
    }

    async fn validate(&self, _ctx: &RunContext, _state: &State) -> Result<(), GuardrailError> {
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
        if timestamps.len() >= self.max_calls {
            return Err(GuardrailError::rejected(
                self.name(),
                format!("more than {} runs within {:?}", self.max_calls, self.window),
            ));
        }
        timestamps.push_back(now);
        Ok(())
    }
}
