use graph_rdb_common::error::GraphError;
use graph_rdb_model::GraphName;
use oxrdfio::RdfParseError;
use std::io;

/// An error raised while loading a file into a [GraphRdb](crate::graph::GraphRdb).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoaderError {
    /// An error raised while reading the file.
    #[error(transparent)]
    Parsing(#[from] RdfParseError),
    /// An error raised during the insertion in the graph.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The file contains a quad outside of the default graph.
    #[error("a graph only holds triples, found a quad in the named graph {0}")]
    NamedGraph(GraphName),
}

impl From<LoaderError> for io::Error {
    #[inline]
    fn from(error: LoaderError) -> Self {
        match error {
            LoaderError::Parsing(error) => error.into(),
            LoaderError::Graph(error) => Self::other(error),
            LoaderError::NamedGraph(graph) => Self::new(
                io::ErrorKind::InvalidData,
                format!("unexpected quad in the named graph {graph}"),
            ),
        }
    }
}

/// An error raised while turning a SPARQL query into patterns and constraints.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BasicQueryError {
    /// The query is not valid SPARQL.
    #[error(transparent)]
    Syntax(#[from] spargebra::SparqlSyntaxError),
    /// The query uses a feature beyond a single basic graph pattern with simple filters.
    #[error("unsupported query: {0}")]
    Unsupported(String),
}
