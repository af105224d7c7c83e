use graph_rdb_common::error::{CorruptionError, StorageError};
use std::io;

/// An error raised while planning, compiling, or executing a query.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// An error from the storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The compiled SQL statement could not be prepared.
    #[error("query prepare failed: {0}")]
    Prepare(#[source] rusqlite::Error),
    /// The compiled SQL statement failed while running.
    #[error("query execute failed: {0}")]
    Execute(#[source] rusqlite::Error),
    /// The graph the query runs against has been closed.
    #[error("the graph has already been closed")]
    Closed,
    #[error("An internal error that likely indicates towards a bug in GraphRDB: {0}")]
    Internal(String),
}

impl QueryError {
    pub fn internal<T>(cause: impl Into<String>) -> Result<T, Self> {
        Err(QueryError::Internal(cause.into()))
    }
}

impl From<CorruptionError> for QueryError {
    #[inline]
    fn from(error: CorruptionError) -> Self {
        Self::Storage(error.into())
    }
}

impl From<QueryError> for io::Error {
    #[inline]
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::Storage(error) => error.into(),
            QueryError::Prepare(error) | QueryError::Execute(error) => Self::other(error),
            QueryError::Closed => Self::new(io::ErrorKind::NotConnected, "graph closed"),
            QueryError::Internal(error) => Self::other(error),
        }
    }
}
