//! Process-wide string-buffer pool for the prompt-building hot path.

use std::sync::Mutex;

use once_cell::sync::Lazy;

/// Buffers kept around between uses; more than this and extras are freed.
const MAX_POOLED: usize = 8;

static POOL: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Runs `f` with a pooled buffer and returns a copy of what it built.
/// The buffer (and its capacity) goes back to the pool afterwards.
pub(crate) fn with_buffer<F>(f: F) -> String
where
    F: FnOnce(&mut String),
{
    let mut buf = POOL
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .pop()
        .unwrap_or_default();
    buf.clear();
    f(&mut buf);
    let out = buf.clone();
    let mut pool = POOL.lock().unwrap_or_else(|e| e.into_inner());
    if pool.len() < MAX_POOLED {
        pool.push(buf);
    }
    out
}
