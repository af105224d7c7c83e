//! Query planning and execution for GraphRDB.
//!
//! A query is a conjunction of triple patterns plus optional [Constraint]s. The
//! [QueryHandler] orders the patterns by cost, groups patterns over the same table into single
//! SQL statements ([DbQuery]), and chains the resulting [Stage]s. Every stage runs on its own
//! worker thread connected to its neighbours by bounded pipes.

mod binding;
mod compiler;
mod constraint;
mod element;
mod error;
mod handler;
mod options;
mod pattern;
mod pipe;
mod query;
mod results;
pub mod stage;
mod var_desc;

pub use binding::{Binding, QuerySolution, VariableMap};
pub use compiler::QueryCompiler;
pub use constraint::Constraint;
pub use element::{Element, FreeVar};
pub use error::QueryError;
pub use handler::{QueryHandler, QueryPlan};
pub use options::QueryOptions;
pub use pattern::{DbPattern, StorageRestriction, COST_MAX};
pub use pipe::{pipe, PipeItem, PipeReceiver, PipeSender, DEFAULT_PIPE_CAPACITY};
pub use query::DbQuery;
pub use results::QueryResults;
pub use stage::Stage;
pub use var_desc::VarDesc;
