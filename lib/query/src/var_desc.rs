use crate::error::QueryError;
use graph_rdb_common::ColumnName;

/// Describes one variable of a compiled query and the column that produces its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarDesc {
    var_index: usize,
    is_arg: bool,
    binding: Option<(String, ColumnName)>,
}

impl VarDesc {
    pub fn new(var_index: usize, is_arg: bool) -> Self {
        Self {
            var_index,
            is_arg,
            binding: None,
        }
    }

    pub fn var_index(&self) -> usize {
        self.var_index
    }

    pub fn is_arg(&self) -> bool {
        self.is_arg
    }

    /// The `(alias, column)` pair the variable is bound to.
    pub fn binding(&self) -> Option<(&str, ColumnName)> {
        self.binding
            .as_ref()
            .map(|(alias, column)| (alias.as_str(), *column))
    }

    /// Binds the variable to a column. A variable is bound at most once per query.
    pub fn bind(&mut self, alias: &str, column: ColumnName) -> Result<(), QueryError> {
        if let Some((bound_alias, bound_column)) = &self.binding {
            return QueryError::internal(format!(
                "variable #{} is already bound to {bound_alias}.{bound_column}",
                self.var_index
            ));
        }
        self.binding = Some((alias.to_owned(), column));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_once() {
        let mut desc = VarDesc::new(0, false);
        desc.bind("A0", ColumnName::Subj).unwrap();

        assert_eq!(desc.binding(), Some(("A0", ColumnName::Subj)));
        assert!(matches!(
            desc.bind("A1", ColumnName::Obj),
            Err(QueryError::Internal(_))
        ));
    }
}
