//! PostgreSQL repository implementations of the store contracts.

pub mod audit;
pub mod chat;
pub mod notice;
pub mod project;

use projecthub_core::error::{AppError, ErrorKind};

/// Map an sqlx error onto the application error taxonomy.
///
/// Connectivity failures become transient `ServiceUnavailable` errors so
/// callers retry instead of treating the action as recorded.
pub(crate) fn db_error(context: &str, e: sqlx::Error) -> AppError {
    let kind = match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            ErrorKind::ServiceUnavailable
        }
        _ => ErrorKind::Database,
    };
    AppError::with_source(kind, context.to_string(), e)
}
