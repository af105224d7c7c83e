//! The SQL-backed specialized graphs of GraphRDB.
//!
//! Every graph stores its asserted statements in a [StatementTable] and its reification fragments
//! in a [ReificationTable]. Rows of several graphs may share a table and are told apart by their
//! graph id.

mod decode;
pub mod reification;
pub mod statements;

pub use reification::{ReificationTable, SpecializedGraphReifier};
pub use statements::{SpecializedGraphTripleStore, StatementTable};
