//! # NextStep Core Library
//!
//! This library provides the "What Next?" suggestion engine: it offers one
//! task at a time from a personal task list, picked by weighted random draw
//! so the same winner is not repeated, and softens tasks the user has just
//! declined instead of hiding them. The `nextstep` CLI is a thin layer over
//! the same library.
//!
//! ## Architecture
//!
//! - **Scoring**: A pure function of a task, the scoring weights and two
//!   resolved flags (dampened, prioritized)
//! - **Suggest**: Session-scoped dampening, day-scoped priority boost, the
//!   weighted random selector and the session state machine
//! - **Source**: Task pool traits the engine reads from and requests
//!   transitions through
//! - **Storage**: SQLite task store and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SuggestionSession`]: The "What Next?" state machine
//! - [`ScoringWeights`]: The five tunable weights
//! - [`TaskDb`]: Task and daily-priority persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod scoring;
pub mod source;
pub mod storage;
pub mod suggest;
pub mod task;

pub use error::{ConfigError, CoreError, DatabaseError, SuggestionError, ValidationError};
pub use scoring::{ScoreBreakdown, ScoringStrategy, ScoringWeights, StrategyRegistry};
pub use source::{InMemoryTaskStore, TaskMutator, TaskSource};
pub use storage::{Config, TaskDb};
pub use suggest::{
    DampeningTracker, PriorityTracker, ScoredCandidate, SessionState, SharedSession, Step,
    Suggestion, SuggestionSession,
};
pub use task::{Impact, Task, TaskState, TaskTransitionError, Urgency};
