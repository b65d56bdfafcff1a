//! SQLite-based storage for tasks and morning-planning selections.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use super::data_dir;
use super::migrations;
use crate::error::{DatabaseError, Result, SuggestionError};
use crate::source::{TaskMutator, TaskSource};
use crate::suggest::PriorityTracker;
use crate::task::{Impact, Task, TaskState, TaskTransitionError, Urgency};

const TASK_COLUMNS: &str = "id, title, description, impact, urgency, state, due_date,
                            created_at, updated_at, completed_at";

// === Helper Functions ===

fn parse_task_state(state_str: &str) -> TaskState {
    state_str.parse().unwrap_or_default()
}

fn parse_impact(impact_str: Option<String>) -> Option<Impact> {
    impact_str.and_then(|s| s.parse().ok())
}

fn parse_urgency(level: Option<i64>) -> Option<Urgency> {
    level
        .and_then(|l| u8::try_from(l).ok())
        .and_then(|l| Urgency::try_from(l).ok())
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_datetime_opt(dt_str: Option<String>) -> Option<DateTime<Utc>> {
    dt_str.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn row_to_task(row: &rusqlite::Row) -> std::result::Result<Task, rusqlite::Error> {
    let state_str: String = row.get(5)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        impact: parse_impact(row.get(3)?),
        urgency: parse_urgency(row.get(4)?),
        state: parse_task_state(&state_str),
        due_date: parse_datetime_opt(row.get(6)?),
        created_at: parse_datetime_fallback(&created_at_str),
        updated_at: parse_datetime_fallback(&updated_at_str),
        completed_at: parse_datetime_opt(row.get(9)?),
    })
}

/// SQLite task store.
pub struct TaskDb {
    conn: Connection,
}

impl TaskDb {
    /// Open the task database at `<data dir>/nextstep.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("nextstep.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        debug!(path = %path.display(), "task database opened");
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    pub fn create_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tasks (
                id, title, description, impact, urgency, state, due_date,
                created_at, updated_at, completed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                task.id,
                task.title,
                task.description,
                task.impact.map(Impact::as_str),
                task.urgency.map(Urgency::level),
                task.state.as_str(),
                task.due_date.map(|dt| dt.to_rfc3339()),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
                task.completed_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        let task = self
            .conn
            .query_row(&sql, params![id], row_to_task)
            .optional()?;
        Ok(task)
    }

    /// All tasks, oldest first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Tasks whose state is one of `states`, ordered by id.
    pub fn list_by_states(&self, states: &[TaskState]) -> Result<Vec<Task>> {
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (1..=states.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE state IN ({placeholders}) ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_from_iter(states.iter().map(|s| s.as_str())), row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn update_task(&self, task: &Task) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?2, description = ?3, impact = ?4, urgency = ?5,
                    state = ?6, due_date = ?7, updated_at = ?8, completed_at = ?9
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.description,
                task.impact.map(Impact::as_str),
                task.urgency.map(Urgency::level),
                task.state.as_str(),
                task.due_date.map(|dt| dt.to_rfc3339()),
                task.updated_at.to_rfc3339(),
                task.completed_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        if changed == 0 {
            return Err(SuggestionError::UnknownTask(task.id.clone()).into());
        }
        Ok(())
    }

    /// Delete a task. Returns false if it did not exist.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM daily_priorities WHERE task_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Replace the morning-planning selection for `day`. Returns how many distinct ids were saved.
    pub fn save_priorities<I, S>(&self, day: NaiveDate, task_ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let day_str = format_day(day);
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM daily_priorities WHERE day = ?1", params![day_str])?;
        let mut count = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO daily_priorities (day, task_id, expired, saved_at)
                 VALUES (?1, ?2, 0, ?3)",
            )?;
            for id in task_ids {
                count += stmt.execute(params![day_str, id.as_ref(), now])?;
            }
        }
        tx.commit()?;
        info!(day = %day_str, count, "daily priorities saved");
        Ok(count)
    }

    /// Rebuild the tracker for `day`. A day with no saved selection yields an empty tracker.
    pub fn load_priorities(&self, day: NaiveDate) -> Result<PriorityTracker> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, expired FROM daily_priorities WHERE day = ?1 ORDER BY task_id",
        )?;
        let rows = stmt
            .query_map(params![format_day(day)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(PriorityTracker::new());
        }
        let expired = rows.iter().any(|(_, expired)| *expired);
        Ok(PriorityTracker::restored(
            day,
            rows.into_iter().map(|(id, _)| id),
            expired,
        ))
    }

    /// Mark the selection for `day` expired. Idempotent; returns rows touched.
    pub fn expire_priorities(&self, day: NaiveDate) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE daily_priorities SET expired = 1 WHERE day = ?1",
            params![format_day(day)],
        )?;
        Ok(changed)
    }
}

impl TaskSource for TaskDb {
    fn list_candidates(&self, states: &[TaskState]) -> Result<Vec<Task>> {
        self.list_by_states(states)
    }
}

impl TaskMutator for TaskDb {
    fn transition(&self, task_id: &str, new_state: TaskState) -> Result<Task> {
        let mut task = self
            .get_task(task_id)?
            .ok_or_else(|| SuggestionError::UnknownTask(task_id.to_string()))?;
        let from = task.state;
        task.transition_to(new_state)?;

        // Compare-and-set on the old state so a concurrent change is not overwritten.
        let changed = self.conn.execute(
            "UPDATE tasks SET state = ?3, updated_at = ?4, completed_at = ?5
             WHERE id = ?1 AND state = ?2",
            params![
                task.id,
                from.as_str(),
                task.state.as_str(),
                task.updated_at.to_rfc3339(),
                task.completed_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        if changed == 0 {
            let current = self
                .get_task(task_id)?
                .ok_or_else(|| SuggestionError::UnknownTask(task_id.to_string()))?;
            return Err(TaskTransitionError {
                from: current.state,
                to: new_state,
            }
            .into());
        }
        debug!(task_id, from = %from, to = %new_state, "task transitioned");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn make_test_task(id: &str) -> Task {
        let mut task = Task::with_id(id, "Test task")
            .impact(Impact::B)
            .urgency(Urgency::CanDefer);
        task.description = Some("A test task".to_string());
        task
    }

    #[test]
    fn create_and_get_task() {
        let db = TaskDb::open_memory().unwrap();
        let task = make_test_task("t1");
        db.create_task(&task).unwrap();

        let retrieved = db.get_task("t1").unwrap().unwrap();
        assert_eq!(retrieved.title, "Test task");
        assert_eq!(retrieved.impact, Some(Impact::B));
        assert_eq!(retrieved.urgency, Some(Urgency::CanDefer));
        assert_eq!(retrieved.state, TaskState::Ready);
        assert_eq!(retrieved.description.as_deref(), Some("A test task"));
        assert!(db.get_task("missing").unwrap().is_none());
    }

    #[test]
    fn unset_impact_and_urgency_round_trip() {
        let db = TaskDb::open_memory().unwrap();
        db.create_task(&Task::with_id("bare", "No categories")).unwrap();
        let t = db.get_task("bare").unwrap().unwrap();
        assert_eq!(t.impact, None);
        assert_eq!(t.urgency, None);
    }

    #[test]
    fn duplicate_id_is_a_database_error() {
        let db = TaskDb::open_memory().unwrap();
        db.create_task(&make_test_task("t1")).unwrap();
        let err = db.create_task(&make_test_task("t1")).unwrap_err();
        assert!(matches!(err, CoreError::Database(_)));
    }

    #[test]
    fn list_by_states_filters() {
        let db = TaskDb::open_memory().unwrap();
        db.create_task(&make_test_task("b")).unwrap();
        db.create_task(&make_test_task("a")).unwrap();
        db.create_task(&make_test_task("c").in_state(TaskState::Parked)).unwrap();

        let ready: Vec<_> = db
            .list_candidates(&[TaskState::Ready])
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ready, vec!["a", "b"]);
        assert_eq!(db.list_tasks().unwrap().len(), 3);
        assert!(db.list_candidates(&[]).unwrap().is_empty());
        assert_eq!(
            db.list_candidates(&[TaskState::Ready, TaskState::Parked]).unwrap().len(),
            3
        );
    }

    #[test]
    fn update_and_delete() {
        let db = TaskDb::open_memory().unwrap();
        let mut task = make_test_task("t1");
        db.create_task(&task).unwrap();

        task.title = "Renamed".into();
        task.impact = Some(Impact::A);
        db.update_task(&task).unwrap();
        let t = db.get_task("t1").unwrap().unwrap();
        assert_eq!(t.title, "Renamed");
        assert_eq!(t.impact, Some(Impact::A));

        assert!(db.delete_task("t1").unwrap());
        assert!(!db.delete_task("t1").unwrap());
        assert!(db.update_task(&task).is_err());
    }

    #[test]
    fn transition_persists_state() {
        let db = TaskDb::open_memory().unwrap();
        db.create_task(&make_test_task("t1")).unwrap();
        let moved = db.transition("t1", TaskState::InProgress).unwrap();
        assert_eq!(moved.state, TaskState::InProgress);
        assert_eq!(db.get_task("t1").unwrap().unwrap().state, TaskState::InProgress);

        let done = db.transition("t1", TaskState::Completed).unwrap();
        assert!(done.completed_at.is_some());
        assert!(db.get_task("t1").unwrap().unwrap().completed_at.is_some());
    }

    #[test]
    fn illegal_transition_is_recoverable() {
        let db = TaskDb::open_memory().unwrap();
        db.create_task(&make_test_task("t1").in_state(TaskState::Blocked)).unwrap();
        let err = db.transition("t1", TaskState::InProgress).unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(err, CoreError::Transition(_)));

        let err = db.transition("nope", TaskState::InProgress).unwrap_err();
        assert!(matches!(err, CoreError::Suggestion(SuggestionError::UnknownTask(_))));
    }

    #[test]
    fn priorities_round_trip_and_overwrite() {
        let db = TaskDb::open_memory().unwrap();
        assert!(!db.load_priorities(day(2)).unwrap().is_prioritized("t1"));

        db.save_priorities(day(2), ["t1", "t2"]).unwrap();
        let p = db.load_priorities(day(2)).unwrap();
        assert!(p.is_prioritized("t1"));
        assert!(p.is_prioritized("t2"));
        assert_eq!(p.day(), Some(day(2)));

        db.save_priorities(day(2), ["t3"]).unwrap();
        let p = db.load_priorities(day(2)).unwrap();
        assert!(!p.is_prioritized("t1"));
        assert!(p.is_prioritized("t3"));

        // Other days are independent.
        assert!(!db.load_priorities(day(3)).unwrap().is_prioritized("t3"));
    }

    #[test]
    fn duplicate_priority_ids_are_counted_once() {
        let db = TaskDb::open_memory().unwrap();
        assert_eq!(db.save_priorities(day(2), ["t1", "t2", "t1"]).unwrap(), 2);
        assert_eq!(db.load_priorities(day(2)).unwrap().active_ids().len(), 2);
    }

    #[test]
    fn expire_priorities_is_idempotent() {
        let db = TaskDb::open_memory().unwrap();
        db.save_priorities(day(2), ["t1"]).unwrap();
        assert_eq!(db.expire_priorities(day(2)).unwrap(), 1);
        assert_eq!(db.expire_priorities(day(2)).unwrap(), 1);

        let p = db.load_priorities(day(2)).unwrap();
        assert!(p.is_expired());
        assert!(!p.is_prioritized("t1"));

        // A new selection the same day is active again.
        db.save_priorities(day(2), ["t1"]).unwrap();
        assert!(db.load_priorities(day(2)).unwrap().is_prioritized("t1"));
    }

    #[test]
    fn delete_task_drops_its_priority() {
        let db = TaskDb::open_memory().unwrap();
        db.create_task(&make_test_task("t1")).unwrap();
        db.save_priorities(day(2), ["t1"]).unwrap();
        db.delete_task("t1").unwrap();
        assert!(!db.load_priorities(day(2)).unwrap().is_prioritized("t1"));
    }

    #[test]
    fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nextstep.db");
        {
            let db = TaskDb::open_at(&path).unwrap();
            db.create_task(&make_test_task("t1")).unwrap();
        }
        let db = TaskDb::open_at(&path).unwrap();
        assert!(db.get_task("t1").unwrap().is_some());
    }
}
