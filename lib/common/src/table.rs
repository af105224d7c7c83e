use std::fmt::{Display, Formatter};

/// The kind of rows a table holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Asserted statements: `(Subj, Prop, Obj, GraphId)`.
    Statements,
    /// Reification fragments: `(Stmt, Subj, Prop, Obj, HasType, GraphId)`. Every column but
    /// `Stmt`, `HasType`, and `GraphId` is nullable.
    Reifications,
}

/// The fixed column roles known to the query compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnName {
    Subj,
    Prop,
    Obj,
    Stmt,
    HasType,
    GraphId,
}

impl ColumnName {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnName::Subj => "Subj",
            ColumnName::Prop => "Prop",
            ColumnName::Obj => "Obj",
            ColumnName::Stmt => "Stmt",
            ColumnName::HasType => "HasType",
            ColumnName::GraphId => "GraphId",
        }
    }
}

impl Display for ColumnName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the SQL table backing a specialized graph and the graph rows inside it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableDescriptor {
    name: String,
    kind: TableKind,
    graph_id: i64,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, kind: TableKind, graph_id: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            graph_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn graph_id(&self) -> i64 {
        self.graph_id
    }

    /// Whether `column` may hold `NULL` in this table.
    pub fn is_nullable(&self, column: ColumnName) -> bool {
        self.kind == TableKind::Reifications
            && matches!(column, ColumnName::Subj | ColumnName::Prop | ColumnName::Obj)
    }
}
