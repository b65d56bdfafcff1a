//! Core error types for nextstep-core.
//!
//! This module defines the error hierarchy using thiserror. Suggestion
//! outcomes that are expected steady states (an empty Ready pool) are
//! still errors at the type level so callers must handle them, but they
//! are never logged as failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskTransitionError;

/// Core error type for nextstep-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Suggestion engine errors
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),

    /// Task state transition rejected by the task store
    #[error(transparent)]
    Transition(#[from] TaskTransitionError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// True when the caller should re-fetch and re-present instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::Transition(_)
                | CoreError::Suggestion(SuggestionError::NoCandidates)
                | CoreError::Suggestion(SuggestionError::UnknownTask(_))
        )
    }

    /// True when the Ready pool was empty.
    pub fn is_no_candidates(&self) -> bool {
        matches!(self, CoreError::Suggestion(SuggestionError::NoCandidates))
    }
}

/// Errors raised by scoring, selection and the suggestion session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuggestionError {
    /// The candidate pool is empty; nothing to suggest right now.
    #[error("No Ready tasks to suggest")]
    NoCandidates,

    /// The session received a response that is not legal in its current state.
    #[error("Action '{action}' is not allowed while the session is {state}")]
    InvalidAction { state: String, action: String },

    /// No scoring strategy registered under this name.
    #[error("Unknown scoring strategy: {0}")]
    UnknownStrategy(String),

    /// The task store has no task with this id.
    #[error("Task not found: {0}")]
    UnknownTask(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
