//! Unified error type for the school desk.
//!
//! Domain failures (duplicate keys, missing CSV columns, artifact I/O) get their own
//! variants so callers can tell them apart from plain database errors.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// All errors surfaced by the store, the aggregators, the import/export adapter
/// and the exam registry.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// A write hit a unique key that already exists
    #[error("{entity} with {field} '{value}' already exists")]
    DuplicateKey {
        /// Entity whose unique key collided (e.g. "Teacher")
        entity: &'static str,
        /// Name of the unique column
        field: &'static str,
        /// The colliding value
        value: String,
    },

    /// No row with the given id
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity that was looked up
        entity: &'static str,
        /// The id that does not exist
        id: i64,
    },

    /// A value failed validation before reaching the database
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// An import file lacks required header columns; nothing was written
    #[error("CSV is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        /// Required columns absent from the header row
        missing: Vec<String>,
    },

    /// An export was requested for a table that does not exist
    #[error("Unknown table: {name}")]
    UnknownTable {
        /// The name that failed to resolve
        name: String,
    },

    /// The blob store could not read, write or remove an artifact
    #[error("Artifact '{name}' I/O failure: {source}")]
    ArtifactIo {
        /// Stored artifact name
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// CSV reader/writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure outside the blob store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Converts a database error into [`Error::DuplicateKey`] when it is a unique
    /// constraint violation, and into [`Error::Database`] otherwise.
    pub(crate) fn from_write(
        err: DbErr,
        entity: &'static str,
        field: &'static str,
        value: &str,
    ) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateKey {
                entity,
                field,
                value: value.to_string(),
            },
            _ => Self::Database(err),
        }
    }

    /// Whether this is a uniqueness violation.
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
