//! Error types for the Payroll Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while configuring pay components,
//! generating payroll runs and moving runs through the approval workflow.
//!
//! Per-employee computation problems (a missing tax rule, a negative net pay)
//! are not errors: they are recorded as exception flags on the affected
//! payroll row and never abort a batch.

use thiserror::Error;

/// The main error type for the Payroll Engine.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::Validation {
///     field: "max_salary".to_string(),
///     message: "must not be below min_salary".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid field 'max_salary': must not be below min_salary"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Input was malformed and was rejected before anything was persisted.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The action is not legal for the record's current status.
    #[error("Cannot {action}: status is '{current}', requires '{required}'")]
    StateConflict {
        /// The attempted action.
        action: String,
        /// The status the record is currently in.
        current: String,
        /// The status (or statuses) the action requires.
        required: String,
    },

    /// The acting role is not permitted to perform the action.
    #[error("Role '{role}' is not authorized to {action}")]
    Unauthorized {
        /// The role that attempted the action.
        role: String,
        /// The attempted action.
        action: String,
    },

    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The kind of record (e.g. "payroll run").
        kind: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A payroll run already exists for the entity and period.
    #[error("A payroll run already exists for entity '{entity}' in period {period}")]
    DuplicateRun {
        /// The entity the run belongs to.
        entity: String,
        /// The payroll period month (YYYY-MM).
        period: String,
    },

    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Creates a validation error for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        EngineError::NotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
