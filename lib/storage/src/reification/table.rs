use crate::decode::{decode_optional, decode_subject};
use crate::reification::{ReificationComponent, ReificationRow};
use graph_rdb_common::error::{CorruptionError, StorageError};
use graph_rdb_common::{ColumnName, TableDescriptor, TripleSource};
use graph_rdb_driver::{RdbConnection, SqlDriver};
use graph_rdb_model::{NodePattern, Subject, Term, TermRef, Triple, TripleMatch};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::Arc;

type RawRow = (i64, String, Option<String>, Option<String>, Option<String>, bool);

/// A restriction on the rows of the reification table.
#[derive(Clone, Copy, Debug)]
enum RowFilter<'a> {
    Equals(ColumnName, TermRef<'a>),
    HasType,
    Complete,
}

/// The rows of one graph in the reification table.
///
/// Methods taking a [Connection] run inside the caller's transaction.
#[derive(Debug)]
pub struct ReificationTable {
    connection: Arc<RdbConnection>,
    table: TableDescriptor,
}

impl ReificationTable {
    pub fn new(connection: Arc<RdbConnection>, table: TableDescriptor) -> Self {
        Self { connection, table }
    }

    pub fn connection(&self) -> &Arc<RdbConnection> {
        &self.connection
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    fn driver(&self) -> &dyn SqlDriver {
        self.connection.driver().as_ref()
    }

    fn encode(&self, term: TermRef<'_>) -> String {
        self.driver().node_to_rdb_string(term)
    }

    /// All rows of `node`, in insertion order.
    pub fn rows_for_node(
        &self,
        conn: &Connection,
        node: &Subject,
    ) -> Result<Vec<ReificationRow>, StorageError> {
        self.select_rows(conn, &[RowFilter::Equals(ColumnName::Stmt, node.as_ref().into())])
    }

    /// The first row of `node` holding the fragment `(node, component, value)`.
    pub fn row_with_fragment(
        &self,
        conn: &Connection,
        node: &Subject,
        component: ReificationComponent,
        value: TermRef<'_>,
    ) -> Result<Option<ReificationRow>, StorageError> {
        let component_filter = match component {
            ReificationComponent::Type => RowFilter::HasType,
            _ => RowFilter::Equals(component.column(), value),
        };
        let rows = self.select_rows(
            conn,
            &[
                RowFilter::Equals(ColumnName::Stmt, node.as_ref().into()),
                component_filter,
            ],
        )?;
        if rows.len() > 1 {
            return Err(CorruptionError::msg(format!(
                "{} reification rows of {node} hold the same {component:?} fragment",
                rows.len()
            ))
            .into());
        }
        Ok(rows.into_iter().next())
    }

    /// Complete rows, optionally restricted to those reifying `triple`.
    pub fn complete_rows(
        &self,
        conn: &Connection,
        triple: Option<&Triple>,
    ) -> Result<Vec<ReificationRow>, StorageError> {
        let mut filters = vec![RowFilter::Complete];
        if let Some(triple) = triple {
            filters.extend([
                RowFilter::Equals(ColumnName::Subj, triple.subject.as_ref().into()),
                RowFilter::Equals(ColumnName::Prop, triple.predicate.as_ref().into()),
                RowFilter::Equals(ColumnName::Obj, triple.object.as_ref()),
            ]);
        }
        self.select_rows(conn, &filters)
    }

    /// The fragment triples matching `pattern`. Variables act as wildcards.
    pub fn find_fragments(
        &self,
        conn: &Connection,
        pattern: &TripleMatch,
    ) -> Result<Vec<Triple>, StorageError> {
        let mut filters = Vec::new();
        if let NodePattern::Term(subject) = &pattern.subject {
            if subject.is_literal() {
                return Ok(Vec::new());
            }
            filters.push(RowFilter::Equals(ColumnName::Stmt, subject.as_ref()));
        }
        if let NodePattern::Term(predicate) = &pattern.predicate {
            let Term::NamedNode(predicate) = predicate else {
                return Ok(Vec::new());
            };
            let Some(component) = ReificationComponent::of_predicate(predicate.as_ref()) else {
                return Ok(Vec::new());
            };
            match (component, pattern.object.as_term()) {
                (ReificationComponent::Type, _) => filters.push(RowFilter::HasType),
                (component, Some(object)) => {
                    filters.push(RowFilter::Equals(component.column(), object.as_ref()));
                }
                (_, None) => {}
            }
        }

        let rows = self.select_rows(conn, &filters)?;
        Ok(rows
            .iter()
            .flat_map(ReificationRow::fragments)
            .filter(|triple| pattern.matches(triple.as_ref()))
            .collect())
    }

    /// The number of fragments stored for the graph.
    pub fn fragment_count(&self, conn: &Connection) -> Result<usize, StorageError> {
        let sql = format!(
            "SELECT COALESCE(SUM((Subj IS NOT NULL) + (Prop IS NOT NULL) + (Obj IS NOT NULL) + HasType), 0) \
             FROM {} WHERE {}",
            self.table.name(),
            self.graph_qualifier()
        );
        let count: i64 = conn.prepare_cached(&sql)?.query_row([], |row| row.get(0))?;
        usize::try_from(count).map_err(|e| StorageError::Other(Box::new(e)))
    }

    pub fn insert_row(&self, conn: &Connection, row: &ReificationRow) -> Result<(), StorageError> {
        let sql = format!(
            "INSERT INTO {} (Stmt, Subj, Prop, Obj, HasType, GraphId) VALUES (?, ?, ?, ?, ?, ?)",
            self.table.name()
        );
        let mut params = vec![Value::Text(self.encode(row.node.as_ref().into()))];
        params.extend(self.component_values(row));
        params.push(Value::Integer(self.table.graph_id()));
        conn.prepare_cached(&sql)?.execute(params_from_iter(params))?;
        Ok(())
    }

    pub fn update_row(&self, conn: &Connection, row: &ReificationRow) -> Result<(), StorageError> {
        let sql = format!(
            "UPDATE {} SET Subj = ?, Prop = ?, Obj = ?, HasType = ? WHERE {} = ?",
            self.table.name(),
            self.driver().row_id_column()
        );
        let mut params = self.component_values(row);
        params.push(Value::Integer(row.row_id));
        conn.prepare_cached(&sql)?.execute(params_from_iter(params))?;
        Ok(())
    }

    pub fn delete_row(&self, conn: &Connection, row_id: i64) -> Result<(), StorageError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.table.name(),
            self.driver().row_id_column()
        );
        conn.prepare_cached(&sql)?.execute([row_id])?;
        Ok(())
    }

    /// Deletes every row of the graph and returns how many rows were removed.
    pub fn remove_all(&self, conn: &Connection) -> Result<usize, StorageError> {
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.table.name(),
            self.graph_qualifier()
        );
        Ok(conn.execute(&sql, [])?)
    }

    fn component_values(&self, row: &ReificationRow) -> Vec<Value> {
        let mut values = [&row.subject, &row.predicate, &row.object]
            .into_iter()
            .map(|term| {
                term.as_ref()
                    .map_or(Value::Null, |term| Value::Text(self.encode(term.as_ref())))
            })
            .collect::<Vec<_>>();
        values.push(Value::Integer(i64::from(row.has_type)));
        values
    }

    fn graph_qualifier(&self) -> String {
        self.driver()
            .gen_sql_qual_graph_id(self.table.name(), self.table.graph_id())
    }

    fn select_rows(
        &self,
        conn: &Connection,
        filters: &[RowFilter<'_>],
    ) -> Result<Vec<ReificationRow>, StorageError> {
        let name = self.table.name();
        let mut qualifiers = vec![self.graph_qualifier()];
        let mut params = Vec::new();
        for filter in filters {
            match filter {
                RowFilter::Equals(column, term) => {
                    qualifiers.push(self.driver().gen_sql_qual_param(name, *column));
                    params.push(self.encode(*term));
                }
                RowFilter::HasType => {
                    qualifiers.push(self.driver().gen_sql_qual_not_null(name, ColumnName::HasType));
                }
                RowFilter::Complete => {
                    qualifiers.push(self.driver().gen_sql_qual_complete(name));
                }
            }
        }
        let sql = format!(
            "SELECT {row_id}, Stmt, Subj, Prop, Obj, HasType FROM {name} WHERE {} ORDER BY {row_id}",
            qualifiers.join(" AND "),
            row_id = self.driver().row_id_column(),
        );

        let mut statement = conn.prepare_cached(&sql)?;
        let raw_rows = statement
            .query_map(params_from_iter(params), |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<Result<Vec<RawRow>, _>>()?;
        raw_rows
            .into_iter()
            .map(|raw| self.decode_row(raw))
            .collect()
    }

    fn decode_row(&self, raw: RawRow) -> Result<ReificationRow, StorageError> {
        let (row_id, node, subject, predicate, object, has_type) = raw;
        let driver = self.driver();
        Ok(ReificationRow {
            row_id,
            node: decode_subject(driver, &node)?,
            subject: decode_optional(driver, subject.as_deref())?,
            predicate: decode_optional(driver, predicate.as_deref())?,
            object: decode_optional(driver, object.as_deref())?,
            has_type,
        })
    }
}

impl TripleSource for ReificationTable {
    fn find(&self, pattern: &TripleMatch) -> Result<Vec<Triple>, StorageError> {
        self.connection
            .with_connection(|conn| self.find_fragments(conn, pattern))
    }
}
