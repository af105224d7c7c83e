use crate::binding::Binding;
use crate::error::QueryError;
use graph_rdb_common::TableDescriptor;
use graph_rdb_driver::RdbConnection;
use rusqlite::params_from_iter;

/// A compiled SQL statement that evaluates a group of patterns.
///
/// The statement is immutable once compiled and runs once per incoming binding, with the values
/// of [Self::arg_index] substituted for its `?` placeholders in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbQuery {
    sql: String,
    result_vars: Vec<usize>,
    arg_index: Vec<usize>,
    alias_count: usize,
    table: Option<TableDescriptor>,
}

impl DbQuery {
    pub(crate) fn new(
        sql: String,
        result_vars: Vec<usize>,
        arg_index: Vec<usize>,
        alias_count: usize,
        table: TableDescriptor,
    ) -> Self {
        Self {
            sql,
            result_vars,
            arg_index,
            alias_count,
            table: Some(table),
        }
    }

    /// A query over no table. It never runs and never yields a row.
    pub fn empty() -> Self {
        Self {
            sql: String::new(),
            result_vars: Vec::new(),
            arg_index: Vec::new(),
            alias_count: 0,
            table: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_none()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The binding slots filled by the result columns, in column order.
    pub fn result_vars(&self) -> &[usize] {
        &self.result_vars
    }

    /// The binding slots substituted for the placeholders, in placeholder order.
    pub fn arg_index(&self) -> &[usize] {
        &self.arg_index
    }

    pub fn alias_count(&self) -> usize {
        self.alias_count
    }

    pub fn table(&self) -> Option<&TableDescriptor> {
        self.table.as_ref()
    }

    /// Runs the statement for `binding` and returns one extended copy of it per row.
    ///
    /// Every row is read before the connection is released.
    pub fn execute(
        &self,
        connection: &RdbConnection,
        binding: &Binding,
    ) -> Result<Vec<Binding>, QueryError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let driver = connection.driver();
        let args = self
            .arg_index
            .iter()
            .map(|index| match binding.get(*index) {
                Some(value) => Ok(driver.node_to_rdb_string(value.as_ref())),
                None => QueryError::internal(format!("argument #{index} is not bound")),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let width = self.result_vars.len();
        let rows = connection.with_connection(|conn| {
            let mut statement = conn.prepare_cached(&self.sql).map_err(QueryError::Prepare)?;
            let mut rows = statement
                .query(params_from_iter(args.iter()))
                .map_err(QueryError::Execute)?;
            let mut values = Vec::new();
            while let Some(row) = rows.next().map_err(QueryError::Execute)? {
                let columns = (0..width)
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(QueryError::Execute)?;
                values.push(columns);
            }
            Ok::<_, QueryError>(values)
        })?;

        rows.into_iter()
            .map(|columns| {
                let mut result = binding.clone();
                for (index, value) in self.result_vars.iter().zip(columns) {
                    if let Some(value) = value {
                        result.set(*index, driver.rdb_string_to_node(&value)?);
                    }
                }
                Ok(result)
            })
            .collect()
    }
}
