//! Database error taxonomy shared across services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised by the database layer.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a connection to PostgreSQL
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Schema migration failed
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Invalid connection configuration
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
