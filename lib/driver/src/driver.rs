use crate::codec::{decode_node, encode_node};
use crate::SqliteDriver;
use graph_rdb_common::error::CorruptionError;
use graph_rdb_common::{ColumnName, MatchFunction, TableDescriptor};
use graph_rdb_model::vocab::rdf;
use graph_rdb_model::{Term, TermRef};
use itertools::Itertools;
use rusqlite::Connection;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// The database dialects GraphRDB can talk to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DriverKind {
    #[default]
    Sqlite,
}

impl DriverKind {
    /// Creates the driver for this dialect.
    pub fn create_driver(self) -> Arc<dyn SqlDriver> {
        match self {
            DriverKind::Sqlite => Arc::new(SqliteDriver::new()),
        }
    }
}

impl Display for DriverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for DriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DriverKind::Sqlite),
            other => Err(format!("unsupported database driver '{other}'")),
        }
    }
}

/// Generates the SQL text of a particular database dialect.
///
/// The default methods produce standard SQL. A dialect only overrides what differs.
pub trait SqlDriver: Debug + Send + Sync {
    /// The dialect implemented by this driver.
    fn kind(&self) -> DriverKind;

    /// Encodes a term as a column value. See [encode_node].
    fn node_to_rdb_string(&self, term: TermRef<'_>) -> String {
        encode_node(term)
    }

    /// Decodes a column value. See [decode_node].
    fn rdb_string_to_node(&self, encoded: &str) -> Result<Term, CorruptionError> {
        decode_node(encoded)
    }

    /// Quotes `value` as an SQL string literal.
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// The name of the `index`-th table alias of a query.
    fn alias_name(&self, index: usize) -> String {
        format!("A{index}")
    }

    /// The expression that yields the encoded node stored in `column`.
    ///
    /// `HasType` is a flag, so its expression yields the encoded `rdf:Statement` when the flag is
    /// set and `NULL` otherwise.
    fn column_expr(&self, alias: &str, column: ColumnName) -> String {
        match column {
            ColumnName::HasType => format!(
                "CASE WHEN {alias}.{column} = 1 THEN {} END",
                self.quote_literal(&self.node_to_rdb_string(rdf::STATEMENT.into()))
            ),
            _ => format!("{alias}.{column}"),
        }
    }

    /// `column` equals the constant `term`.
    fn gen_sql_qual_const(&self, alias: &str, column: ColumnName, term: TermRef<'_>) -> String {
        match column {
            ColumnName::HasType if term == TermRef::from(rdf::STATEMENT) => {
                format!("{alias}.{column} = 1")
            }
            ColumnName::HasType => "1 = 0".to_owned(),
            _ => format!(
                "{} = {}",
                self.column_expr(alias, column),
                self.quote_literal(&self.node_to_rdb_string(term))
            ),
        }
    }

    /// `column` equals the next positional parameter.
    fn gen_sql_qual_param(&self, alias: &str, column: ColumnName) -> String {
        format!("{} = ?", self.column_expr(alias, column))
    }

    /// `column` holds a value.
    fn gen_sql_qual_not_null(&self, alias: &str, column: ColumnName) -> String {
        match column {
            ColumnName::HasType => format!("{alias}.{column} = 1"),
            _ => format!("{alias}.{column} IS NOT NULL"),
        }
    }

    /// The row belongs to the graph `graph_id`.
    fn gen_sql_qual_graph_id(&self, alias: &str, graph_id: i64) -> String {
        format!("{alias}.{} = {graph_id}", ColumnName::GraphId)
    }

    /// The reification row carries all four components of its statement.
    fn gen_sql_qual_complete(&self, alias: &str) -> String {
        [ColumnName::Subj, ColumnName::Prop, ColumnName::Obj, ColumnName::HasType]
            .into_iter()
            .map(|column| self.gen_sql_qual_not_null(alias, column))
            .join(" AND ")
    }

    /// Equates a column of a new alias with a column of an alias that already binds the value.
    fn gen_sql_join(
        &self,
        alias: &str,
        column: ColumnName,
        bound_alias: &str,
        bound_column: ColumnName,
    ) -> String {
        format!(
            "{} = {}",
            self.column_expr(alias, column),
            self.column_expr(bound_alias, bound_column)
        )
    }

    /// A string comparison on the node stored in `column`.
    fn gen_sql_string_match(
        &self,
        alias: &str,
        column: ColumnName,
        function: MatchFunction,
        pattern: &str,
        case_sensitive: bool,
    ) -> String;

    /// Assembles a `SELECT` statement.
    ///
    /// `tables` holds `(table name, alias)` pairs. A query without result columns selects the
    /// constant `1` so that each matching row is still returned.
    fn gen_sql_select(
        &self,
        result_columns: &[String],
        tables: &[(String, String)],
        qualifiers: &[String],
    ) -> String {
        let columns = if result_columns.is_empty() {
            "1".to_owned()
        } else {
            result_columns.join(", ")
        };
        let from = tables
            .iter()
            .map(|(table, alias)| format!("{table} {alias}"))
            .join(", ");
        if qualifiers.is_empty() {
            format!("SELECT {columns} FROM {from}")
        } else {
            format!(
                "SELECT {columns} FROM {from} WHERE {}",
                qualifiers.join(" AND ")
            )
        }
    }

    /// The statements creating `table` and its indexes, if they do not exist yet.
    fn create_table_statements(&self, table: &TableDescriptor) -> Vec<String>;

    /// The column uniquely identifying a row.
    fn row_id_column(&self) -> &'static str;

    /// Registers the SQL functions the generated SQL relies on.
    fn register_functions(&self, connection: &Connection) -> rusqlite::Result<()>;
}
