mod cache;
mod graph;
mod mask;
mod row;
mod table;

pub use cache::{ReificationCache, ReificationCacheEntry};
pub use graph::SpecializedGraphReifier;
pub use mask::{ReificationComponent, ReificationStatementMask};
pub use row::ReificationRow;
pub use table::ReificationTable;
