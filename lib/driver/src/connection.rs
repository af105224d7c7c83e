use crate::{DriverKind, SqlDriver};
use graph_rdb_common::error::StorageError;
use graph_rdb_common::TableDescriptor;
use rusqlite::{Connection, Transaction};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// The number of prepared statements kept per connection unless configured otherwise.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 64;

/// A database connection shared by the specialized graphs and the query stages of a graph.
///
/// SQLite connections are not thread-safe, so every access goes through a mutex. Callers must
/// not hold on to the connection while waiting for another thread.
pub struct RdbConnection {
    connection: Mutex<Connection>,
    driver: Arc<dyn SqlDriver>,
}

impl RdbConnection {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>, kind: DriverKind) -> Result<Self, StorageError> {
        let connection = Connection::open(path)?;
        connection.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(connection, kind)
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory(kind: DriverKind) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?, kind)
    }

    /// Wraps an existing connection and registers the SQL functions of the driver.
    pub fn from_connection(connection: Connection, kind: DriverKind) -> Result<Self, StorageError> {
        let driver = kind.create_driver();
        driver.register_functions(&connection)?;
        connection.set_prepared_statement_cache_capacity(DEFAULT_STATEMENT_CACHE_CAPACITY);
        tracing::debug!(driver = %kind, "Opened database connection");
        Ok(Self {
            connection: Mutex::new(connection),
            driver,
        })
    }

    pub fn driver(&self) -> &Arc<dyn SqlDriver> {
        &self.driver
    }

    /// Sets how many prepared statements are cached. `0` disables the cache.
    pub fn set_statement_cache_capacity(&self, capacity: usize) -> Result<(), StorageError> {
        let connection = self.lock()?;
        if capacity == 0 {
            connection.flush_prepared_statement_cache();
        }
        connection.set_prepared_statement_cache_capacity(capacity);
        Ok(())
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_connection<T, E: From<StorageError>>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, E>,
    ) -> Result<T, E> {
        let connection = self.lock()?;
        f(&connection)
    }

    /// Runs `f` inside a transaction that is committed if `f` succeeds and rolled back otherwise.
    pub fn with_transaction<T, E: From<StorageError>>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction().map_err(StorageError::from)?;
        let result = f(&transaction)?;
        transaction.commit().map_err(StorageError::from)?;
        Ok(result)
    }

    /// Creates the given tables and their indexes if they do not exist yet.
    pub fn format_db(&self, tables: &[&TableDescriptor]) -> Result<(), StorageError> {
        let statements = tables
            .iter()
            .flat_map(|table| self.driver.create_table_statements(table))
            .collect::<Vec<_>>();
        self.with_transaction(|transaction| {
            for statement in &statements {
                transaction.execute(statement, [])?;
            }
            Ok::<_, StorageError>(())
        })?;
        tracing::debug!(tables = tables.len(), "Formatted database tables");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.connection
            .lock()
            .map_err(|_| StorageError::Other("the database connection mutex is poisoned".into()))
    }
}

impl Debug for RdbConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdbConnection")
            .field("driver", &self.driver.kind())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_rdb_common::TableKind;

    #[test]
    fn format_db_is_idempotent() -> Result<(), StorageError> {
        let connection = RdbConnection::open_in_memory(DriverKind::Sqlite)?;
        let stmt = TableDescriptor::new("t_stmt", TableKind::Statements, 1);
        let reif = TableDescriptor::new("t_reif", TableKind::Reifications, 1);
        connection.format_db(&[&stmt, &reif])?;
        connection.format_db(&[&stmt, &reif])?;

        let count: i64 = connection.with_connection(|c| {
            Ok::<_, StorageError>(c.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )?)
        })?;
        assert_eq!(count, 2);
        Ok(())
    }

    #[test]
    fn failed_transaction_rolls_back() -> Result<(), StorageError> {
        let connection = RdbConnection::open_in_memory(DriverKind::Sqlite)?;
        let stmt = TableDescriptor::new("t_stmt", TableKind::Statements, 1);
        connection.format_db(&[&stmt])?;

        let result = connection.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO t_stmt (Subj, Prop, Obj, GraphId) VALUES ('a', 'b', 'c', 1)",
                [],
            )?;
            Err::<(), _>(StorageError::Other("abort".into()))
        });
        assert!(result.is_err());

        let count: i64 = connection.with_connection(|c| {
            Ok::<_, StorageError>(c.query_row("SELECT COUNT(*) FROM t_stmt", [], |row| row.get(0))?)
        })?;
        assert_eq!(count, 0);
        Ok(())
    }
}
