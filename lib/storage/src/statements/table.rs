use crate::decode::decode_triple;
use graph_rdb_common::error::StorageError;
use graph_rdb_common::{ColumnName, TableDescriptor, TripleSource};
use graph_rdb_driver::{RdbConnection, SqlDriver};
use graph_rdb_model::{NodePattern, Triple, TripleMatch};
use rusqlite::{params_from_iter, Connection};
use std::sync::Arc;

/// The asserted statements of one graph.
#[derive(Debug)]
pub struct StatementTable {
    connection: Arc<RdbConnection>,
    table: TableDescriptor,
    skip_duplicate_check: bool,
}

impl StatementTable {
    /// Creates a new table view. With `skip_duplicate_check`, storing a triple never checks
    /// whether it is already present.
    pub fn new(
        connection: Arc<RdbConnection>,
        table: TableDescriptor,
        skip_duplicate_check: bool,
    ) -> Self {
        Self {
            connection,
            table,
            skip_duplicate_check,
        }
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    fn driver(&self) -> &dyn SqlDriver {
        self.connection.driver().as_ref()
    }

    /// Stores `triple`. Returns false if it was already present.
    pub fn store_triple(&self, triple: &Triple) -> Result<bool, StorageError> {
        self.connection
            .with_connection(|conn| self.store_in(conn, triple))
    }

    /// Stores all `triples` in one transaction. Returns the number of inserted triples.
    pub fn store_triples(&self, triples: &[Triple]) -> Result<usize, StorageError> {
        let inserted = self.connection.with_transaction(|tx| {
            let mut inserted = 0;
            for triple in triples {
                if self.store_in(tx, triple)? {
                    inserted += 1;
                }
            }
            Ok::<_, StorageError>(inserted)
        })?;
        tracing::debug!(
            table = self.table.name(),
            requested = triples.len(),
            inserted,
            "Stored statement batch"
        );
        Ok(inserted)
    }

    /// Deletes `triple`. Deleting a missing triple does nothing and returns false.
    pub fn delete_triple(&self, triple: &Triple) -> Result<bool, StorageError> {
        self.connection
            .with_connection(|conn| self.delete_in(conn, triple))
    }

    /// Deletes all `triples` in one transaction. Returns the number of deleted triples.
    pub fn delete_triples(&self, triples: &[Triple]) -> Result<usize, StorageError> {
        self.connection.with_transaction(|tx| {
            let mut deleted = 0;
            for triple in triples {
                if self.delete_in(tx, triple)? {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })
    }

    pub fn contains(&self, triple: &Triple) -> Result<bool, StorageError> {
        self.connection
            .with_connection(|conn| self.contains_in(conn, triple))
    }

    /// Returns the triples matching `pattern`. Variables act as wildcards.
    pub fn find(&self, pattern: &TripleMatch) -> Result<Vec<Triple>, StorageError> {
        let name = self.table.name();
        let mut qualifiers = vec![self.driver().gen_sql_qual_graph_id(name, self.table.graph_id())];
        let mut params = Vec::new();
        for (column, position) in [
            (ColumnName::Subj, &pattern.subject),
            (ColumnName::Prop, &pattern.predicate),
            (ColumnName::Obj, &pattern.object),
        ] {
            if let NodePattern::Term(term) = position {
                qualifiers.push(self.driver().gen_sql_qual_param(name, column));
                params.push(self.driver().node_to_rdb_string(term.as_ref()));
            }
        }
        let sql = format!(
            "SELECT Subj, Prop, Obj FROM {name} WHERE {}",
            qualifiers.join(" AND ")
        );

        let rows = self.connection.with_connection(|conn| {
            let mut statement = conn.prepare_cached(&sql)?;
            let rows = statement
                .query_map(params_from_iter(params), |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<Result<Vec<(String, String, String)>, _>>()?;
            Ok::<_, StorageError>(rows)
        })?;
        rows.iter()
            .map(|(s, p, o)| decode_triple(self.driver(), s, p, o).map_err(StorageError::from))
            .collect()
    }

    pub fn triple_count(&self) -> Result<usize, StorageError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            self.table.name(),
            self.driver()
                .gen_sql_qual_graph_id(self.table.name(), self.table.graph_id())
        );
        let count: i64 = self
            .connection
            .with_connection(|conn| Ok::<_, StorageError>(conn.query_row(&sql, [], |row| row.get(0))?))?;
        usize::try_from(count).map_err(|e| StorageError::Other(Box::new(e)))
    }

    /// Deletes every statement of the graph. Returns the number of removed rows.
    pub fn remove_statements(&self) -> Result<usize, StorageError> {
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.table.name(),
            self.driver()
                .gen_sql_qual_graph_id(self.table.name(), self.table.graph_id())
        );
        let removed = self
            .connection
            .with_connection(|conn| Ok::<_, StorageError>(conn.execute(&sql, [])?))?;
        tracing::debug!(table = self.table.name(), removed, "Removed statements");
        Ok(removed)
    }

    fn store_in(&self, conn: &Connection, triple: &Triple) -> Result<bool, StorageError> {
        if !self.skip_duplicate_check && self.contains_in(conn, triple)? {
            return Ok(false);
        }
        let sql = format!(
            "INSERT INTO {} (Subj, Prop, Obj, GraphId) VALUES (?, ?, ?, ?)",
            self.table.name()
        );
        let [s, p, o] = self.encode(triple);
        conn.prepare_cached(&sql)?
            .execute(rusqlite::params![s, p, o, self.table.graph_id()])?;
        Ok(true)
    }

    fn delete_in(&self, conn: &Connection, triple: &Triple) -> Result<bool, StorageError> {
        let sql = format!(
            "DELETE FROM {} WHERE Subj = ? AND Prop = ? AND Obj = ? AND GraphId = ?",
            self.table.name()
        );
        let [s, p, o] = self.encode(triple);
        let deleted = conn
            .prepare_cached(&sql)?
            .execute(rusqlite::params![s, p, o, self.table.graph_id()])?;
        Ok(deleted > 0)
    }

    fn contains_in(&self, conn: &Connection, triple: &Triple) -> Result<bool, StorageError> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE Subj = ? AND Prop = ? AND Obj = ? AND GraphId = ? LIMIT 1",
            self.table.name()
        );
        let [s, p, o] = self.encode(triple);
        Ok(conn
            .prepare_cached(&sql)?
            .exists(rusqlite::params![s, p, o, self.table.graph_id()])?)
    }

    fn encode(&self, triple: &Triple) -> [String; 3] {
        let driver = self.driver();
        [
            driver.node_to_rdb_string(triple.subject.as_ref().into()),
            driver.node_to_rdb_string(triple.predicate.as_ref().into()),
            driver.node_to_rdb_string(triple.object.as_ref()),
        ]
    }
}

impl TripleSource for StatementTable {
    fn find(&self, pattern: &TripleMatch) -> Result<Vec<Triple>, StorageError> {
        StatementTable::find(self, pattern)
    }
}
