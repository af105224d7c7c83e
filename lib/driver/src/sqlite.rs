use crate::codec::decode_node;
use crate::{DriverKind, SqlDriver};
use graph_rdb_common::{match_value, ColumnName, MatchFunction, TableDescriptor, TableKind};
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;

/// The SQL function evaluating a [MatchFunction] on an encoded node.
///
/// `rdb_match(encoded, function, pattern, case_sensitive)` returns `NULL` for `NULL` inputs and
/// false for blank nodes.
const MATCH_FUNCTION_NAME: &str = "rdb_match";

/// The driver for SQLite databases.
#[derive(Debug, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }
}

impl SqlDriver for SqliteDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    fn gen_sql_string_match(
        &self,
        alias: &str,
        column: ColumnName,
        function: MatchFunction,
        pattern: &str,
        case_sensitive: bool,
    ) -> String {
        format!(
            "{MATCH_FUNCTION_NAME}({}, {}, {}, {})",
            self.column_expr(alias, column),
            self.quote_literal(function.name()),
            self.quote_literal(pattern),
            i32::from(case_sensitive)
        )
    }

    fn create_table_statements(&self, table: &TableDescriptor) -> Vec<String> {
        let name = table.name();
        match table.kind() {
            TableKind::Statements => vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {name} (\
                     Subj TEXT NOT NULL, \
                     Prop TEXT NOT NULL, \
                     Obj TEXT NOT NULL, \
                     GraphId INTEGER NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS {name}_xsp ON {name} (GraphId, Subj, Prop)"),
                format!("CREATE INDEX IF NOT EXISTS {name}_xp ON {name} (GraphId, Prop)"),
                format!("CREATE INDEX IF NOT EXISTS {name}_xo ON {name} (GraphId, Obj)"),
            ],
            TableKind::Reifications => vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {name} (\
                     Stmt TEXT NOT NULL, \
                     Subj TEXT, \
                     Prop TEXT, \
                     Obj TEXT, \
                     HasType INTEGER NOT NULL DEFAULT 0, \
                     GraphId INTEGER NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS {name}_xstmt ON {name} (GraphId, Stmt)"),
                format!(
                    "CREATE INDEX IF NOT EXISTS {name}_xspo ON {name} (GraphId, Subj, Prop, Obj)"
                ),
            ],
        }
    }

    fn row_id_column(&self) -> &'static str {
        "rowid"
    }

    fn register_functions(&self, connection: &Connection) -> rusqlite::Result<()> {
        connection.create_scalar_function(
            MATCH_FUNCTION_NAME,
            4,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            rdb_match,
        )
    }
}

fn rdb_match(ctx: &Context<'_>) -> rusqlite::Result<Option<bool>> {
    let Some(encoded) = ctx.get::<Option<String>>(0)? else {
        return Ok(None);
    };
    let function = ctx
        .get::<String>(1)?
        .parse::<MatchFunction>()
        .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
    let pattern = ctx.get::<String>(2)?;
    let case_sensitive = ctx.get::<bool>(3)?;

    let term =
        decode_node(&encoded).map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
    Ok(Some(match_value(term.as_ref()).is_some_and(|value| {
        function.matches(value, &pattern, case_sensitive)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_rdb_model::vocab::rdf;
    use graph_rdb_model::{Literal, NamedNode};

    fn driver() -> SqliteDriver {
        SqliteDriver::new()
    }

    #[test]
    fn qualifiers() {
        let d = driver();
        let p = NamedNode::new_unchecked("http://example.com/it's");
        assert_eq!(
            d.gen_sql_qual_const("A0", ColumnName::Prop, p.as_ref().into()),
            "A0.Prop = 'Uv::http://example.com/it''s'"
        );
        assert_eq!(d.gen_sql_qual_param("A1", ColumnName::Subj), "A1.Subj = ?");
        assert_eq!(
            d.gen_sql_join("A1", ColumnName::Subj, "A0", ColumnName::Obj),
            "A1.Subj = A0.Obj"
        );
        assert_eq!(d.gen_sql_qual_graph_id("A0", 1), "A0.GraphId = 1");
    }

    #[test]
    fn type_flag_qualifiers() {
        let d = driver();
        assert_eq!(
            d.gen_sql_qual_const("A0", ColumnName::HasType, rdf::STATEMENT.into()),
            "A0.HasType = 1"
        );
        assert_eq!(
            d.gen_sql_qual_const("A0", ColumnName::HasType, rdf::PROPERTY.into()),
            "1 = 0"
        );
        insta::assert_snapshot!(d.column_expr("A0", ColumnName::HasType), @"CASE WHEN A0.HasType = 1 THEN 'Uv::http://www.w3.org/1999/02/22-rdf-syntax-ns#Statement' END");
        insta::assert_snapshot!(d.gen_sql_qual_complete("A2"), @"A2.Subj IS NOT NULL AND A2.Prop IS NOT NULL AND A2.Obj IS NOT NULL AND A2.HasType = 1");
    }

    #[test]
    fn select_statement() {
        let d = driver();
        let sql = d.gen_sql_select(
            &["A0.Subj".to_owned(), "A1.Obj".to_owned()],
            &[
                ("rdb_stmt".to_owned(), "A0".to_owned()),
                ("rdb_stmt".to_owned(), "A1".to_owned()),
            ],
            &["A0.GraphId = 1".to_owned(), "A1.Subj = A0.Subj".to_owned()],
        );
        insta::assert_snapshot!(sql, @"SELECT A0.Subj, A1.Obj FROM rdb_stmt A0, rdb_stmt A1 WHERE A0.GraphId = 1 AND A1.Subj = A0.Subj");

        let sql = d.gen_sql_select(&[], &[("rdb_stmt".to_owned(), "A0".to_owned())], &[]);
        assert_eq!(sql, "SELECT 1 FROM rdb_stmt A0");
    }

    #[test]
    fn match_function_in_sql() -> rusqlite::Result<()> {
        let d = driver();
        let conn = Connection::open_in_memory()?;
        d.register_functions(&conn)?;

        let encoded = d.node_to_rdb_string(Literal::new_simple_literal("Paris").as_ref().into());
        let matched: bool = conn.query_row(
            "SELECT rdb_match(?1, 'starts_with', 'par', 0)",
            [&encoded],
            |row| row.get(0),
        )?;
        assert!(matched);

        let matched: bool = conn.query_row(
            "SELECT rdb_match(?1, 'starts_with', 'par', 1)",
            [&encoded],
            |row| row.get(0),
        )?;
        assert!(!matched);

        let matched: bool = conn.query_row(
            "SELECT rdb_match('Bv::b0', 'contains', 'b', 1)",
            [],
            |row| row.get(0),
        )?;
        assert!(!matched);
        Ok(())
    }
}
