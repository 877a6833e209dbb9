//! Unified error types for the finance tracker.
//!
//! Interactive operations surface [`Error::Validation`] and [`Error::NotFound`]
//! to the caller unchanged. [`Error::Materialization`] only occurs inside a
//! scheduled pass, where it is logged and counted per recurrence.

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// User-supplied data violates a structural or business rule
    #[error("Validation failed for `{field}`: {message}")]
    Validation {
        /// Name of the offending field
        field: String,
        /// Human-readable reason
        message: String,
    },

    /// A referenced entity does not exist or belongs to another owner
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up (e.g. "account")
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Creating a transaction for a recurrence failed during a scheduled pass
    #[error("Failed to materialize recurrence {recurrence_id}: {message}")]
    Materialization {
        /// Recurrence being processed
        recurrence_id: i64,
        /// Underlying reason
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// The goal proposal generator failed or returned unusable data
    #[error("Goal proposal error: {message}")]
    Proposal {
        /// Description of the problem
        message: String,
    },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing or malformed
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for building a [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
