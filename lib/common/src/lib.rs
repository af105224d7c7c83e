pub mod error;
mod reification_behavior;
mod specialized_graph;
mod string_match;
mod table;

pub use reification_behavior::ReificationBehavior;
pub use specialized_graph::{CompletionFlag, SpecializedGraph, SubsumeResult, TripleSource};
pub use string_match::{match_value, MatchFunction};
pub use table::{ColumnName, TableDescriptor, TableKind};
