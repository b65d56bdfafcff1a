//! Task model as consumed by the suggestion engine.
//!
//! Tasks are owned by the persistence collaborator. The engine reads them and
//! only ever asks the collaborator to move a task from Ready to InProgress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// How strongly a task advances personal values. A is highest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Impact {
    A,
    B,
    C,
    D,
}

impl Impact {
    pub const ALL: [Impact; 4] = [Impact::A, Impact::B, Impact::C, Impact::D];

    /// Numeric value used by scoring: A=4 .. D=1.
    pub fn value(self) -> f64 {
        match self {
            Impact::A => 4.0,
            Impact::B => 3.0,
            Impact::C => 2.0,
            Impact::D => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Impact::A => "A",
            Impact::B => "B",
            Impact::C => "C",
            Impact::D => "D",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impact {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Impact::A),
            "B" => Ok(Impact::B),
            "C" => Ok(Impact::C),
            "D" => Ok(Impact::D),
            other => Err(ValidationError::InvalidValue {
                field: "impact".into(),
                message: format!("expected one of A, B, C, D; got '{other}'"),
            }),
        }
    }
}

/// Time pressure on a task. 1 is most urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub enum Urgency {
    Immediate = 1,
    Soon = 2,
    CanDefer = 3,
    LongTerm = 4,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [
        Urgency::Immediate,
        Urgency::Soon,
        Urgency::CanDefer,
        Urgency::LongTerm,
    ];

    /// Category number as the user enters it (1-4).
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Numeric value used by scoring: 1=4 .. 4=1.
    pub fn value(self) -> f64 {
        f64::from(5 - self.level())
    }

    /// Urgency 3 and 4: the task can wait or is long-term.
    pub fn is_deferrable(self) -> bool {
        matches!(self, Urgency::CanDefer | Urgency::LongTerm)
    }
}

impl TryFrom<u8> for Urgency {
    type Error = ValidationError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Urgency::Immediate),
            2 => Ok(Urgency::Soon),
            3 => Ok(Urgency::CanDefer),
            4 => Ok(Urgency::LongTerm),
            other => Err(ValidationError::InvalidValue {
                field: "urgency".into(),
                message: format!("expected 1-4, got {other}"),
            }),
        }
    }
}

impl From<Urgency> for u8 {
    fn from(u: Urgency) -> u8 {
        u.level()
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

impl FromStr for Urgency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level: u8 = s.trim().parse().map_err(|_| ValidationError::InvalidValue {
            field: "urgency".into(),
            message: format!("expected 1-4, got '{s}'"),
        })?;
        Urgency::try_from(level)
    }
}

/// Task state enumeration.
///
/// Valid transitions:
/// - READY → IN_PROGRESS | BLOCKED | PARKED | CANCELLED
/// - IN_PROGRESS → COMPLETED | BLOCKED | PARKED | CANCELLED | READY
/// - BLOCKED → READY | PARKED | CANCELLED
/// - PARKED → READY | CANCELLED
/// - COMPLETED, CANCELLED are terminal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Available for suggestion
    Ready,
    /// Being worked on
    InProgress,
    /// Waiting on something external
    Blocked,
    /// Deliberately set aside
    Parked,
    /// Done (terminal)
    Completed,
    /// Dropped (terminal)
    Cancelled,
}

impl TaskState {
    pub const ALL: [TaskState; 6] = [
        TaskState::Ready,
        TaskState::InProgress,
        TaskState::Blocked,
        TaskState::Parked,
        TaskState::Completed,
        TaskState::Cancelled,
    ];

    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &TaskState) -> bool {
        self.valid_transitions().contains(to)
    }

    /// Get valid next states for this state.
    pub fn valid_transitions(&self) -> &'static [TaskState] {
        match self {
            TaskState::Ready => &[
                TaskState::InProgress,
                TaskState::Blocked,
                TaskState::Parked,
                TaskState::Cancelled,
            ],
            TaskState::InProgress => &[
                TaskState::Completed,
                TaskState::Blocked,
                TaskState::Parked,
                TaskState::Cancelled,
                TaskState::Ready,
            ],
            TaskState::Blocked => &[TaskState::Ready, TaskState::Parked, TaskState::Cancelled],
            TaskState::Parked => &[TaskState::Ready, TaskState::Cancelled],
            TaskState::Completed | TaskState::Cancelled => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Ready => "ready",
            TaskState::InProgress => "in_progress",
            TaskState::Blocked => "blocked",
            TaskState::Parked => "parked",
            TaskState::Completed => "completed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Ready
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        TaskState::ALL
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "state".into(),
                message: format!("unknown task state '{s}'"),
            })
    }
}

/// A task on the personal list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Opaque unique identifier
    pub id: String,
    /// Task title
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Impact category; unset tasks score only on urgency
    #[serde(default)]
    pub impact: Option<Impact>,
    /// Urgency category; unset tasks score only on impact
    #[serde(default)]
    pub urgency: Option<Urgency>,
    /// Current state
    #[serde(default)]
    pub state: TaskState,
    /// Optional due date
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the task enters Completed
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new Ready task with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Task {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            title: title.into(),
            description: None,
            impact: None,
            urgency: None,
            state: TaskState::Ready,
            due_date: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Create a Ready task with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            ..Task::new(title)
        }
    }

    pub fn impact(mut self, impact: Impact) -> Self {
        self.impact = Some(impact);
        self
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    pub fn in_state(mut self, state: TaskState) -> Self {
        self.state = state;
        self
    }

    /// Transition to a new state.
    ///
    /// Returns an error if the transition is invalid.
    pub fn transition_to(&mut self, new_state: TaskState) -> Result<(), TaskTransitionError> {
        if !self.state.can_transition_to(&new_state) {
            return Err(TaskTransitionError {
                from: self.state,
                to: new_state,
            });
        }

        let now = Utc::now();
        if new_state == TaskState::Completed {
            self.completed_at = Some(now);
        }

        self.state = new_state;
        self.updated_at = now;
        Ok(())
    }
}

/// Error returned when an invalid state transition is attempted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskTransitionError {
    pub from: TaskState,
    pub to: TaskState,
}

impl fmt::Display for TaskTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid state transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for TaskTransitionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_and_urgency_values() {
        assert_eq!(Impact::A.value(), 4.0);
        assert_eq!(Impact::D.value(), 1.0);
        assert_eq!(Urgency::Immediate.value(), 4.0);
        assert_eq!(Urgency::LongTerm.value(), 1.0);
        assert!(Urgency::CanDefer.is_deferrable());
        assert!(!Urgency::Soon.is_deferrable());
    }

    #[test]
    fn parse_impact_and_urgency() {
        assert_eq!("a".parse::<Impact>().unwrap(), Impact::A);
        assert!("E".parse::<Impact>().is_err());
        assert_eq!("3".parse::<Urgency>().unwrap(), Urgency::CanDefer);
        assert!("0".parse::<Urgency>().is_err());
        assert!("soon".parse::<Urgency>().is_err());
    }

    #[test]
    fn urgency_serializes_as_number() {
        let json = serde_json::to_string(&Urgency::CanDefer).unwrap();
        assert_eq!(json, "3");
        let back: Urgency = serde_json::from_str("4").unwrap();
        assert_eq!(back, Urgency::LongTerm);
        assert!(serde_json::from_str::<Urgency>("9").is_err());
    }

    #[test]
    fn parse_task_state_variants() {
        assert_eq!("In Progress".parse::<TaskState>().unwrap(), TaskState::InProgress);
        assert_eq!("in-progress".parse::<TaskState>().unwrap(), TaskState::InProgress);
        assert_eq!("READY".parse::<TaskState>().unwrap(), TaskState::Ready);
        assert!("done".parse::<TaskState>().is_err());
    }

    #[test]
    fn ready_transitions() {
        let ready = TaskState::Ready;
        assert!(ready.can_transition_to(&TaskState::InProgress));
        assert!(ready.can_transition_to(&TaskState::Blocked));
        assert!(ready.can_transition_to(&TaskState::Parked));
        assert!(ready.can_transition_to(&TaskState::Cancelled));
        assert!(!ready.can_transition_to(&TaskState::Completed));
        assert!(!ready.can_transition_to(&TaskState::Ready));
    }

    #[test]
    fn in_progress_can_return_to_ready() {
        assert!(TaskState::InProgress.can_transition_to(&TaskState::Ready));
        assert!(TaskState::InProgress.can_transition_to(&TaskState::Completed));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        for state in [TaskState::Completed, TaskState::Cancelled] {
            assert!(state.is_terminal());
            for to in TaskState::ALL {
                assert!(!state.can_transition_to(&to));
            }
        }
        assert!(!TaskState::Parked.is_terminal());
    }

    #[test]
    fn transition_stamps_completion() {
        let mut task = Task::new("Write report");
        task.transition_to(TaskState::InProgress).unwrap();
        assert!(task.completed_at.is_none());
        task.transition_to(TaskState::Completed).unwrap();
        assert_eq!(task.state, TaskState::Completed);
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn invalid_transition_leaves_task_untouched() {
        let mut task = Task::new("Parked idea").in_state(TaskState::Parked);
        let err = task.transition_to(TaskState::InProgress).unwrap_err();
        assert_eq!(err.from, TaskState::Parked);
        assert_eq!(err.to, TaskState::InProgress);
        assert_eq!(task.state, TaskState::Parked);
    }
}
