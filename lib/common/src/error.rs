use graph_rdb_model::{Term, Triple};
use std::error::Error;
use std::io;

/// An error related to storage operations (reads, writes...).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Error reported by the SQL database.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
    /// Error related to data corruption.
    #[error(transparent)]
    Corruption(#[from] CorruptionError),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl From<StorageError> for io::Error {
    #[inline]
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(error) => error,
            StorageError::Database(error) => Self::other(error),
            StorageError::Corruption(error) => error.into(),
            StorageError::Other(error) => Self::other(error),
        }
    }
}

/// An error return if some content in the database is corrupted.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct CorruptionError(#[from] CorruptionErrorKind);

/// An error return if some content in the database is corrupted.
#[derive(Debug, thiserror::Error)]
enum CorruptionErrorKind {
    #[error("{0}")]
    Msg(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl CorruptionError {
    /// Builds an error from another error.
    #[inline]
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(CorruptionErrorKind::Other(error.into()))
    }

    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(CorruptionErrorKind::Msg(msg.into()))
    }
}

impl From<CorruptionError> for io::Error {
    #[inline]
    fn from(error: CorruptionError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}

/// An error raised by a graph-level operation (add, delete, reification).
///
/// [GraphError::AlreadyReified] and [GraphError::CannotReify] are expected outcomes that the
/// caller can recover from. The store is left unchanged when they are returned.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GraphError {
    /// An error from the storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The node already denotes a different, complete statement.
    #[error("{node} already reifies a different statement")]
    AlreadyReified { node: Term },
    /// The existing fragments of the node conflict with the statement.
    #[error("{node} cannot reify {triple}: its existing fragments conflict")]
    CannotReify { node: Term, triple: Triple },
    /// No specialized graph accepted the triple.
    #[error("no specialized graph is able to store the triple {0}")]
    NoSuitableStore(Triple),
    /// The graph has been closed.
    #[error("the graph has already been closed")]
    Closed,
    /// The graph configuration is not usable.
    #[error("invalid graph configuration: {0}")]
    InvalidConfig(String),
    #[error("An internal error that likely indicates towards a bug in GraphRDB: {0}")]
    Internal(String),
}

impl GraphError {
    pub fn internal<T>(cause: impl Into<String>) -> Result<T, Self> {
        Err(GraphError::Internal(cause.into()))
    }
}

impl From<rusqlite::Error> for GraphError {
    #[inline]
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(error.into())
    }
}

impl From<CorruptionError> for GraphError {
    #[inline]
    fn from(error: CorruptionError) -> Self {
        Self::Storage(error.into())
    }
}
