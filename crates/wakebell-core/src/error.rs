//! Core error types for wakebell-core.
//!
//! This module defines the error hierarchy using thiserror. The taxonomy
//! mirrors how failures are handled: validation rejects before any
//! mutation, storage failures are best-effort (logged by the stores),
//! and scheduling failures propagate to the lifecycle caller.

use thiserror::Error;

/// Core error type for wakebell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// User-input validation errors -- rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence errors from the key-value store
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Platform notification scheduler errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Required field is missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// A sleep session is already open
    #[error("A sleep session is already in progress")]
    SessionAlreadyOpen,

    /// Referenced record does not exist
    #[error("No such record: {0}")]
    NotFound(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Read from the key-value store failed
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Write to the key-value store failed
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Stored value could not be decoded
    #[error("Corrupt value at '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Errors raised by the platform notification scheduler.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The platform rejected the schedule request
    #[error("Scheduler rejected '{id}': {message}")]
    Rejected { id: String, message: String },

    /// The scheduling facility is unavailable
    #[error("Notification scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
