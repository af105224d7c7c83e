use crate::binding::VariableMap;
use crate::constraint::Constraint;
use crate::element::Element;
use crate::error::QueryError;
use crate::pattern::DbPattern;
use crate::query::DbQuery;
use crate::var_desc::VarDesc;
use graph_rdb_common::{ColumnName, TableDescriptor, TableKind};
use graph_rdb_driver::SqlDriver;
use graph_rdb_model::vocab::rdf;
use graph_rdb_model::{Term, TermRef};
use rustc_hash::FxHashMap;

/// Translates a group of patterns over one table into a single SQL statement.
#[derive(Debug)]
pub struct QueryCompiler<'a> {
    driver: &'a dyn SqlDriver,
    only_full_reifications: bool,
}

/// Identifies the statement node of a reification pattern for alias sharing.
#[derive(Debug, PartialEq, Eq)]
enum NodeKey {
    Constant(Term),
    Variable(usize),
}

#[derive(Debug, Default)]
struct CompileState {
    tables: Vec<(String, String)>,
    qualifiers: Vec<String>,
    var_descs: FxHashMap<usize, VarDesc>,
    result_vars: Vec<usize>,
    arg_index: Vec<usize>,
    reification_aliases: Vec<(NodeKey, String)>,
}

impl CompileState {
    fn column_of(&self, var_index: usize) -> Option<(String, ColumnName)> {
        self.var_descs
            .get(&var_index)
            .and_then(VarDesc::binding)
            .map(|(alias, column)| (alias.to_owned(), column))
    }
}

impl<'a> QueryCompiler<'a> {
    pub fn new(driver: &'a dyn SqlDriver, only_full_reifications: bool) -> Self {
        Self {
            driver,
            only_full_reifications,
        }
    }

    /// Compiles `group` into one statement over `table`.
    ///
    /// The free variables of the group that are not arguments become result columns, in order of
    /// first appearance. Each constraint must refer to one of them. Without a table the result
    /// is an empty query.
    pub fn compile(
        &self,
        table: Option<&TableDescriptor>,
        variables: &VariableMap,
        group: &mut [DbPattern],
        constraints: &[Constraint],
    ) -> Result<DbQuery, QueryError> {
        let Some(table) = table else {
            return Ok(DbQuery::empty());
        };
        let mut state = CompileState::default();
        for pattern in group.iter_mut() {
            self.compile_pattern(&mut state, table, pattern)?;
        }
        for constraint in constraints {
            self.compile_constraint(&mut state, variables, constraint)?;
        }

        let result_columns = state
            .result_vars
            .iter()
            .map(|index| match state.column_of(*index) {
                Some((alias, column)) => Ok(self.driver.column_expr(&alias, column)),
                None => QueryError::internal(format!("result variable #{index} has no column")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let sql = self
            .driver
            .gen_sql_select(&result_columns, &state.tables, &state.qualifiers);
        tracing::debug!(sql = %sql, args = state.arg_index.len(), "Compiled query stage");

        Ok(DbQuery::new(
            sql,
            state.result_vars,
            state.arg_index,
            state.tables.len(),
            table.clone(),
        ))
    }

    fn compile_pattern(
        &self,
        state: &mut CompileState,
        table: &TableDescriptor,
        pattern: &mut DbPattern,
    ) -> Result<(), QueryError> {
        let (subject_column, predicate_column, object_column) = match table.kind() {
            TableKind::Statements => (ColumnName::Subj, Some(ColumnName::Prop), ColumnName::Obj),
            TableKind::Reifications => (
                ColumnName::Stmt,
                None,
                reifier_object_column(pattern.predicate())?,
            ),
        };
        let share_alias = self.only_full_reifications && table.kind() == TableKind::Reifications;
        let node_key = match pattern.subject() {
            Element::Fixed(term) => Some(NodeKey::Constant(term.clone())),
            element => element.var_index().map(NodeKey::Variable),
        };

        let shared = share_alias
            .then(|| {
                state
                    .reification_aliases
                    .iter()
                    .find(|(key, _)| Some(key) == node_key.as_ref())
                    .map(|(_, alias)| alias.clone())
            })
            .flatten();
        let alias = match shared {
            Some(alias) => alias,
            None => {
                let alias = self.driver.alias_name(state.tables.len());
                state.tables.push((table.name().to_owned(), alias.clone()));
                state
                    .qualifiers
                    .push(self.driver.gen_sql_qual_graph_id(&alias, table.graph_id()));
                if share_alias {
                    state
                        .qualifiers
                        .push(self.driver.gen_sql_qual_complete(&alias));
                    if let Some(key) = node_key {
                        state.reification_aliases.push((key, alias.clone()));
                    }
                }
                alias
            }
        };

        let [subject, predicate, object] = pattern.elements_mut();
        self.compile_element(state, table, &alias, subject_column, subject)?;
        if let Some(column) = predicate_column {
            self.compile_element(state, table, &alias, column, predicate)?;
        }
        self.compile_element(state, table, &alias, object_column, object)
    }

    fn compile_element(
        &self,
        state: &mut CompileState,
        table: &TableDescriptor,
        alias: &str,
        column: ColumnName,
        element: &mut Element,
    ) -> Result<(), QueryError> {
        match element {
            Element::Any => {
                if self.needs_guard(table, column) {
                    state
                        .qualifiers
                        .push(self.driver.gen_sql_qual_not_null(alias, column));
                }
                Ok(())
            }
            Element::Fixed(term) => {
                state
                    .qualifiers
                    .push(self.driver.gen_sql_qual_const(alias, column, term.as_ref()));
                Ok(())
            }
            Element::Bound { var_index, .. } => {
                self.compile_argument(state, alias, column, *var_index)
            }
            Element::Free(free) if free.is_arg() => {
                self.compile_argument(state, alias, column, free.var_index())
            }
            Element::Free(free) => {
                let var_index = free.var_index();
                if let Some(bound) = state.column_of(var_index) {
                    self.compile_join(state, alias, column, bound);
                    return Ok(());
                }
                if self.needs_guard(table, column) {
                    state
                        .qualifiers
                        .push(self.driver.gen_sql_qual_not_null(alias, column));
                }
                let mut desc = VarDesc::new(var_index, false);
                desc.bind(alias, column)?;
                state.var_descs.insert(var_index, desc);
                state.result_vars.push(var_index);
                element.set_listing(state.result_vars.len() - 1)
            }
        }
    }

    /// Whether a column may lack a value, in which case matching it requires a guard. Aliases
    /// restricted to complete reification rows are already guarded.
    fn needs_guard(&self, table: &TableDescriptor, column: ColumnName) -> bool {
        if self.only_full_reifications && table.kind() == TableKind::Reifications {
            return false;
        }
        table.is_nullable(column)
            || (table.kind() == TableKind::Reifications && column == ColumnName::HasType)
    }

    fn compile_argument(
        &self,
        state: &mut CompileState,
        alias: &str,
        column: ColumnName,
        var_index: usize,
    ) -> Result<(), QueryError> {
        if let Some(bound) = state.column_of(var_index) {
            self.compile_join(state, alias, column, bound);
            return Ok(());
        }
        state
            .qualifiers
            .push(self.driver.gen_sql_qual_param(alias, column));
        state.arg_index.push(var_index);
        let mut desc = VarDesc::new(var_index, true);
        desc.bind(alias, column)?;
        state.var_descs.insert(var_index, desc);
        Ok(())
    }

    fn compile_join(
        &self,
        state: &mut CompileState,
        alias: &str,
        column: ColumnName,
        (bound_alias, bound_column): (String, ColumnName),
    ) {
        if bound_alias == alias && bound_column == column {
            return;
        }
        state.qualifiers.push(
            self.driver
                .gen_sql_join(alias, column, &bound_alias, bound_column),
        );
    }

    fn compile_constraint(
        &self,
        state: &mut CompileState,
        variables: &VariableMap,
        constraint: &Constraint,
    ) -> Result<(), QueryError> {
        let column = variables
            .index_of(constraint.variable().as_ref())
            .filter(|index| state.result_vars.contains(index))
            .and_then(|index| state.column_of(index));
        let Some((alias, column)) = column else {
            return QueryError::internal(format!(
                "constraint variable {} is not a result of the query",
                constraint.variable()
            ));
        };
        let qualifier = match constraint {
            Constraint::Match {
                function,
                pattern,
                case_sensitive,
                ..
            } => self
                .driver
                .gen_sql_string_match(&alias, column, *function, pattern, *case_sensitive),
            Constraint::Equals(_, term) => {
                self.driver.gen_sql_qual_const(&alias, column, term.as_ref())
            }
        };
        state.qualifiers.push(qualifier);
        Ok(())
    }
}

/// The reification column holding the object of a pattern with the given predicate.
fn reifier_object_column(predicate: &Element) -> Result<ColumnName, QueryError> {
    let column = match predicate.as_constant().map(Term::as_ref) {
        Some(TermRef::NamedNode(p)) if p == rdf::SUBJECT => Some(ColumnName::Subj),
        Some(TermRef::NamedNode(p)) if p == rdf::PREDICATE => Some(ColumnName::Prop),
        Some(TermRef::NamedNode(p)) if p == rdf::OBJECT => Some(ColumnName::Obj),
        Some(TermRef::NamedNode(p)) if p == rdf::TYPE => Some(ColumnName::HasType),
        _ => None,
    };
    match column {
        Some(column) => Ok(column),
        None => QueryError::internal(format!("unexpected reifier predicate {predicate}")),
    }
}

/// Whether `predicate` selects one column of the reification table.
pub(crate) fn is_reifier_predicate(predicate: &Element) -> bool {
    reifier_object_column(predicate).is_ok()
}
