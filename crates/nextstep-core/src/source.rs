//! Task pool access.
//!
//! The suggestion engine never mutates task state itself. It reads the pool
//! through [`TaskSource`] and asks a [`TaskMutator`] to move a task to
//! In Progress when the user accepts a suggestion.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Result, SuggestionError};
use crate::task::{Task, TaskState};

/// Read access to the task pool.
pub trait TaskSource {
    /// Tasks whose state is one of `states`.
    fn list_candidates(&self, states: &[TaskState]) -> Result<Vec<Task>>;
}

/// State transitions requested by the engine.
pub trait TaskMutator {
    /// Move a task to `new_state`, returning the updated task.
    ///
    /// Fails with `CoreError::Transition` when the move is not legal from
    /// the task's current state.
    fn transition(&self, task_id: &str, new_state: TaskState) -> Result<Task>;
}

/// Process-local task store.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<BTreeMap<String, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        for task in tasks {
            store.insert(task);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a task.
    pub fn insert(&self, task: Task) {
        self.lock().insert(task.id.clone(), task);
    }

    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.lock().get(task_id).cloned()
    }

    pub fn remove(&self, task_id: &str) -> Option<Task> {
        self.lock().remove(task_id)
    }

    /// All tasks ordered by id.
    pub fn all(&self) -> Vec<Task> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl TaskSource for InMemoryTaskStore {
    fn list_candidates(&self, states: &[TaskState]) -> Result<Vec<Task>> {
        Ok(self
            .lock()
            .values()
            .filter(|t| states.contains(&t.state))
            .cloned()
            .collect())
    }
}

impl TaskMutator for InMemoryTaskStore {
    fn transition(&self, task_id: &str, new_state: TaskState) -> Result<Task> {
        let mut tasks = self.lock();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| SuggestionError::UnknownTask(task_id.to_string()))?;
        task.transition_to(new_state)?;
        Ok(task.clone())
    }
}

impl<T: TaskSource + ?Sized> TaskSource for &T {
    fn list_candidates(&self, states: &[TaskState]) -> Result<Vec<Task>> {
        (**self).list_candidates(states)
    }
}

impl<T: TaskMutator + ?Sized> TaskMutator for &T {
    fn transition(&self, task_id: &str, new_state: TaskState) -> Result<Task> {
        (**self).transition(task_id, new_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn store() -> InMemoryTaskStore {
        InMemoryTaskStore::with_tasks([
            Task::with_id("a", "ready one"),
            Task::with_id("b", "running").in_state(TaskState::InProgress),
            Task::with_id("c", "blocked").in_state(TaskState::Blocked),
            Task::with_id("d", "ready two"),
        ])
    }

    #[test]
    fn list_filters_by_state() {
        let s = store();
        let ready: Vec<_> = s
            .list_candidates(&[TaskState::Ready])
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ready, vec!["a", "d"]);

        let both = s
            .list_candidates(&[TaskState::Ready, TaskState::InProgress])
            .unwrap();
        assert_eq!(both.len(), 3);
        assert!(s.list_candidates(&[]).unwrap().is_empty());
    }

    #[test]
    fn transition_updates_stored_task() {
        let s = store();
        let t = s.transition("a", TaskState::InProgress).unwrap();
        assert_eq!(t.state, TaskState::InProgress);
        assert_eq!(s.get("a").unwrap().state, TaskState::InProgress);
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let s = store();
        let err = s.transition("c", TaskState::InProgress).unwrap_err();
        assert!(matches!(err, CoreError::Transition(_)));
        assert!(err.is_recoverable());
        assert_eq!(s.get("c").unwrap().state, TaskState::Blocked);
    }

    #[test]
    fn unknown_task() {
        let s = store();
        let err = s.transition("zzz", TaskState::InProgress).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Suggestion(SuggestionError::UnknownTask(ref id)) if id == "zzz"
        ));
    }

    #[test]
    fn insert_remove() {
        let s = InMemoryTaskStore::new();
        assert!(s.is_empty());
        s.insert(Task::with_id("x", "x"));
        assert_eq!(s.len(), 1);
        assert!(s.remove("x").is_some());
        assert!(s.all().is_empty());
    }
}
