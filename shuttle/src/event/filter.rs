//! Subscription filters: which events a handler receives.
//!
//! A subscription carries zero or more filters; an event is delivered when
//! every filter matches (AND). Richer shapes compose with
//! [`EventFilter::any_of`], [`EventFilter::all_of`], and
//! [`EventFilter::negate`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use super::Event;

/// Event field addressable by a [`EventFilter::Field`] filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventField {
    Id,
    Type,
    AgentId,
    AgentName,
    Error,
}

/// Comparison applied by a field filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldOp {
    Equals,
    Contains,
}

/// A predicate over events.
#[derive(Clone, Debug)]
pub enum EventFilter {
    /// Regex over the event type string (built from a wildcard pattern).
    Pattern(Regex),
    /// Type-set membership.
    Types(HashSet<String>),
    /// Agent identity; unset parts match anything.
    Agent {
        id: Option<String>,
        name: Option<String>,
    },
    /// Matches iff [`Event::is_error`].
    Error,
    /// Metadata entry equality.
    Metadata { key: String, value: Value },
    /// Field comparison by name.
    Field {
        field: EventField,
        op: FieldOp,
        value: String,
    },
    /// Timestamp window; unset ends are open.
    TimeRange {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    All(Vec<EventFilter>),
    Any(Vec<EventFilter>),
    Not(Box<EventFilter>),
}

/// Converts a wildcard pattern (`*` = any run, `?` = any one char) into an
/// anchored regex over the full type string.
pub(crate) fn wildcard_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out)
}

impl EventFilter {
    /// Filter by wildcard pattern over the event type (`"tool.*"`).
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Pattern(wildcard_to_regex(pattern)?))
    }

    /// Filter by exact type membership.
    pub fn types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Types(types.into_iter().map(Into::into).collect())
    }

    /// Filter by emitting agent id.
    pub fn agent_id(id: impl Into<String>) -> Self {
        Self::Agent {
            id: Some(id.into()),
            name: None,
        }
    }

    /// Filter by emitting agent name.
    pub fn agent_name(name: impl Into<String>) -> Self {
        Self::Agent {
            id: None,
            name: Some(name.into()),
        }
    }

    /// Filter to error events only.
    pub fn errors() -> Self {
        Self::Error
    }

    /// Filter by a metadata entry.
    pub fn metadata(key: impl Into<String>, value: Value) -> Self {
        Self::Metadata {
            key: key.into(),
            value,
        }
    }

    /// Filter by a named field with the given comparison.
    pub fn field(field: EventField, op: FieldOp, value: impl Into<String>) -> Self {
        Self::Field {
            field,
            op,
            value: value.into(),
        }
    }

    /// Filter by a timestamp window.
    pub fn time_range(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self::TimeRange { from, to }
    }

    /// All sub-filters must match.
    pub fn all_of(filters: Vec<EventFilter>) -> Self {
        Self::All(filters)
    }

    /// At least one sub-filter must match.
    pub fn any_of(filters: Vec<EventFilter>) -> Self {
        Self::Any(filters)
    }

    /// Inverts a filter.
    pub fn negate(filter: EventFilter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Whether `event` satisfies this filter.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Pattern(re) => re.is_match(&event.event_type),
            Self::Types(set) => set.contains(&event.event_type),
            Self::Agent { id, name } => {
                id.as_deref().map_or(true, |id| id == event.agent_id)
                    && name.as_deref().map_or(true, |n| n == event.agent_name)
            }
            Self::Error => event.is_error(),
            Self::Metadata { key, value } => event.metadata.get(key) == Some(value),
            Self::Field { field, op, value } => {
                let actual: &str = match field {
                    EventField::Id => &event.id,
                    EventField::Type => &event.event_type,
                    EventField::AgentId => &event.agent_id,
                    EventField::AgentName => &event.agent_name,
                    EventField::Error => event.error.as_deref().unwrap_or(""),
                };
                match op {
                    FieldOp::Equals => actual == value,
                    FieldOp::Contains => actual.contains(value.as_str()),
                }
            }
            Self::TimeRange { from, to } => {
                from.map_or(true, |f| event.timestamp >= f)
                    && to.map_or(true, |t| event.timestamp <= t)
            }
            Self::All(filters) => filters.iter().all(|f| f.matches(event)),
            Self::Any(filters) => filters.iter().any(|f| f.matches(event)),
            Self::Not(inner) => !inner.matches(event),
        }
    }
}
