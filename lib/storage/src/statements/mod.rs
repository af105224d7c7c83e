mod graph;
mod table;

pub use graph::SpecializedGraphTripleStore;
pub use table::StatementTable;
