//! Day-scoped priority boost from morning planning.
//!
//! At most one priority set is active. Saving a new selection replaces the
//! previous one; evening review start expires it.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTracker {
    day: Option<NaiveDate>,
    task_ids: BTreeSet<String>,
    expired: bool,
}

impl PriorityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tracker from persisted state without logging a change.
    pub fn restored<I, S>(day: NaiveDate, task_ids: I, expired: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            day: Some(day),
            task_ids: task_ids.into_iter().map(Into::into).collect(),
            expired,
        }
    }

    /// Replace the active priority set with `task_ids` for `day`.
    pub fn set_priorities<I, S>(&mut self, task_ids: I, day: NaiveDate)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task_ids = task_ids.into_iter().map(Into::into).collect();
        self.day = Some(day);
        self.expired = false;
        info!(%day, count = self.task_ids.len(), "daily priorities set");
    }

    /// False once expired.
    pub fn is_prioritized(&self, task_id: &str) -> bool {
        !self.expired && self.task_ids.contains(task_id)
    }

    /// Called at evening review start. Idempotent.
    pub fn expire(&mut self) {
        if !self.expired && self.day.is_some() {
            info!(day = ?self.day, "daily priorities expired");
        }
        self.expired = true;
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }

    /// Currently boosted ids; empty once expired.
    pub fn active_ids(&self) -> Vec<&str> {
        if self.expired {
            return Vec::new();
        }
        self.task_ids.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn set_and_query() {
        let mut p = PriorityTracker::new();
        assert!(!p.is_prioritized("t1"));
        p.set_priorities(["t1", "t2"], day(2));
        assert!(p.is_prioritized("t1"));
        assert!(p.is_prioritized("t2"));
        assert!(!p.is_prioritized("t3"));
        assert_eq!(p.day(), Some(day(2)));
    }

    #[test]
    fn same_day_overwrites_rather_than_merges() {
        let mut p = PriorityTracker::new();
        p.set_priorities(["t1"], day(2));
        p.set_priorities(["t2"], day(2));
        assert!(!p.is_prioritized("t1"));
        assert!(p.is_prioritized("t2"));
    }

    #[test]
    fn expire_is_idempotent() {
        let mut p = PriorityTracker::new();
        p.set_priorities(["t1"], day(2));
        p.expire();
        assert!(!p.is_prioritized("t1"));
        p.expire();
        assert!(!p.is_prioritized("t1"));
        assert!(p.is_expired());
        assert!(p.active_ids().is_empty());
    }

    #[test]
    fn new_selection_after_expiry_is_active() {
        let mut p = PriorityTracker::new();
        p.set_priorities(["t1"], day(2));
        p.expire();
        p.set_priorities(["t9"], day(3));
        assert!(p.is_prioritized("t9"));
        assert!(!p.is_expired());
        assert_eq!(p.active_ids(), vec!["t9"]);
    }
}
