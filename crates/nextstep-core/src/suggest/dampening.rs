//! Session-scoped rejection dampening.
//!
//! Each "reject" marks the task as dampened until the next session boundary
//! (Break, Start, or Evening Review start). Repeated rejections of the same
//! task do not stack. Never persisted.

use std::collections::HashSet;

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct DampeningTracker {
    rejected: HashSet<String>,
}

impl DampeningTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a task as rejected for the rest of the session.
    pub fn reject(&mut self, task_id: &str) {
        if self.rejected.insert(task_id.to_string()) {
            debug!(task_id, "task dampened");
        }
    }

    pub fn is_dampened(&self, task_id: &str) -> bool {
        self.rejected.contains(task_id)
    }

    /// Empty the map. Idempotent.
    pub fn clear(&mut self) {
        if !self.rejected.is_empty() {
            debug!(count = self.rejected.len(), "dampening cleared");
        }
        self.rejected.clear();
    }

    pub fn len(&self) -> usize {
        self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rejected.is_empty()
    }
}
