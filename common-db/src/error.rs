//! Store error classification.

use common_core::AppError;
use thiserror::Error;

pub use sqlx::Error as SqlxError;

/// Failure of a data-access operation, classified for the taxonomy.
#[derive(Debug, Error)]
pub enum DbError {
    /// Transport or pool failure: the store could not be reached.
    #[error("database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("not found: {table} '{id}'")]
    NotFound { table: &'static str, id: String },

    /// Insert rejected by a uniqueness constraint.
    #[error("{table} could not be created: {message}")]
    Conflict { table: &'static str, message: String },

    #[error("database error: {0}")]
    Query(#[source] sqlx::Error),
}

impl DbError {
    /// Classify a driver error raised while working on `table` / `id`.
    pub fn classify(err: sqlx::Error, table: &'static str, id: impl ToString) -> Self {
        if is_connectivity(&err) {
            return Self::Unavailable(err);
        }

        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return Self::Conflict {
                    table,
                    message: db_err.message().to_owned(),
                };
            }
        }

        match err {
            sqlx::Error::RowNotFound => Self::NotFound {
                table,
                id: id.to_string(),
            },
            other => Self::Query(other),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Whether the error means the link to the store is broken.
pub fn is_connectivity(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Unavailable(_) => AppError::connection(),
            DbError::NotFound { table, .. } => AppError::is_not_exist(table),
            DbError::Conflict { table, .. } => AppError::already_exists(table),
            DbError::Query(e) => AppError::unknown(e),
        }
    }
}
