//! Tool registry: name → tool, with category and tag queries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{Tool, ToolDescriptor, ToolError};

/// Registry of tools available to an agent.
///
/// The map is guarded by a reader-writer lock: lookups during dispatch are
/// hot, registration happens at setup. Registering the identical `Arc`
/// twice is a no-op; a different tool under an existing name fails with
/// [`ToolError::Conflict`].
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under its own name.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        let mut tools = self.tools.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = tools.get(&name) {
            if Arc::ptr_eq(existing, &tool) {
                return Ok(());
            }
            return Err(ToolError::Conflict(name));
        }
        tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Descriptors of every registered tool, sorted by name so prompt
    /// construction is deterministic.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> = self
            .tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|t| t.descriptor())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Descriptors of tools in `category`, sorted by name.
    pub fn list_by_category(&self, category: &str) -> Vec<ToolDescriptor> {
        self.list()
            .into_iter()
            .filter(|d| d.category == category)
            .collect()
    }

    /// Descriptors of tools carrying `tag`, sorted by name.
    pub fn search_by_tag(&self, tag: &str) -> Vec<ToolDescriptor> {
        self.list()
            .into_iter()
            .filter(|d| d.tags.iter().any(|t| t == tag))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
