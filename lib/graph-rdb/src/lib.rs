//! An RDF graph stored in a relational database.
//!
//! Triples are spread over specialized graphs: asserted statements live in one table, and the
//! four triples of a reified statement are folded into rows of a second table. The entry point
//! is [GraphRdb](graph::GraphRdb), configured through [GraphConfig](config::GraphConfig).
//!
//! ```
//! use graph_rdb::config::GraphConfig;
//! use graph_rdb::graph::GraphRdb;
//! use graph_rdb::model::{NamedNode, Triple};
//!
//! let mut graph = GraphRdb::open_in_memory(GraphConfig::new())?;
//! let ex = NamedNode::new("http://example.com")?;
//! let triple = Triple::new(ex.clone(), ex.clone(), ex);
//! graph.add(&triple)?;
//! assert!(graph.contains(&triple)?);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reifier;
pub mod sparql;

pub mod model {
    pub use graph_rdb_model::*;
}

pub mod query {
    pub use graph_rdb_query::*;
}

pub mod driver {
    pub use graph_rdb_driver::*;
}

pub mod common {
    pub use graph_rdb_common::*;
}
