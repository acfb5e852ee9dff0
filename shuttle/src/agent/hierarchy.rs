//! Agent hierarchy: owned children, weak parent back-references.
//!
//! The tree is a relation over [`AgentHandle`]s, not ownership between
//! agents themselves: a handle owns its children's cells and holds a
//! non-owning `Weak` back to its parent, so parent↔child cycles cannot
//! leak. Sibling names are unique; attach/detach update both sides under
//! the parent's lock.

use std::sync::{Arc, RwLock, Weak};

use thiserror::Error;

use super::Agent;

/// Errors from hierarchy mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("sibling name already taken: {0}")]
    DuplicateName(String),
    #[error("attaching {0} would create a cycle")]
    Cycle(String),
    #[error("agent {0} already has a parent")]
    AlreadyAttached(String),
}

struct AgentCell {
    agent: Arc<dyn Agent>,
    parent: RwLock<Weak<AgentCell>>,
    children: RwLock<Vec<Arc<AgentCell>>>,
}

/// A node in an agent tree.
///
/// Cloning a handle clones the reference, not the subtree.
#[derive(Clone)]
pub struct AgentHandle {
    cell: Arc<AgentCell>,
}

impl AgentHandle {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self {
            cell: Arc::new(AgentCell {
                agent,
                parent: RwLock::new(Weak::new()),
                children: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn agent(&self) -> Arc<dyn Agent> {
        Arc::clone(&self.cell.agent)
    }

    pub fn name(&self) -> &str {
        // The cell owns the agent, so the name borrow is tied to self.
        self.cell.agent.name()
    }

    /// Attaches `child` under this node.
    ///
    /// Fails when a sibling already carries the child's name, when the
    /// child is already attached elsewhere, or when the attachment would
    /// close a cycle. On success, `child.parent()` points back here.
    pub fn add_sub_agent(&self, child: &AgentHandle) -> Result<(), HierarchyError> {
        if Arc::ptr_eq(&self.cell, &child.cell) || self.is_descendant_of(child) {
            return Err(HierarchyError::Cycle(child.name().to_string()));
        }
        if child
            .cell
            .parent
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .strong_count()
            > 0
        {
            return Err(HierarchyError::AlreadyAttached(child.name().to_string()));
        }

        let mut children = self.cell.children.write().unwrap_or_else(|e| e.into_inner());
        if children.iter().any(|c| c.agent.name() == child.name()) {
            return Err(HierarchyError::DuplicateName(child.name().to_string()));
        }
        // Both sides update while the parent's child list is held.
        *child.cell.parent.write().unwrap_or_else(|e| e.into_inner()) =
            Arc::downgrade(&self.cell);
        children.push(Arc::clone(&child.cell));
        Ok(())
    }

    /// Detaches the direct child called `name`, clearing its parent link.
    /// Returns whether a child was removed.
    pub fn remove_sub_agent(&self, name: &str) -> bool {
        let mut children = self.cell.children.write().unwrap_or_else(|e| e.into_inner());
        let before = children.len();
        children.retain(|c| {
            if c.agent.name() == name {
                *c.parent.write().unwrap_or_else(|e| e.into_inner()) = Weak::new();
                false
            } else {
                true
            }
        });
        children.len() < before
    }

    /// Direct children, in attachment order.
    pub fn sub_agents(&self) -> Vec<AgentHandle> {
        self.cell
            .children
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|c| AgentHandle { cell: Arc::clone(c) })
            .collect()
    }

    pub fn parent(&self) -> Option<AgentHandle> {
        self.cell
            .parent
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .upgrade()
            .map(|cell| AgentHandle { cell })
    }

    /// Finds a direct child by name.
    pub fn find_sub_agent(&self, name: &str) -> Option<AgentHandle> {
        self.sub_agents().into_iter().find(|c| c.name() == name)
    }

    /// Depth-first search over this node and its subtree.
    pub fn find_agent(&self, name: &str) -> Option<AgentHandle> {
        if self.name() == name {
            return Some(self.clone());
        }
        for child in self.sub_agents() {
            if let Some(found) = child.find_agent(name) {
                return Some(found);
            }
        }
        None
    }

    fn is_descendant_of(&self, other: &AgentHandle) -> bool {
        let mut current = self.parent();
        while let Some(node) = current {
            if Arc::ptr_eq(&node.cell, &other.cell) {
                return true;
            }
            current = node.parent();
        }
        false
    }
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("name", &self.name())
            .field("children", &self.sub_agents().len())
            .finish()
    }
}
