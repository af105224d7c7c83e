use crate::config::GraphConfig;
use crate::error::LoaderError;
use crate::reifier::Reifier;
use crate::sparql::BasicQuery;
use graph_rdb_common::error::GraphError;
use graph_rdb_common::{CompletionFlag, SpecializedGraph};
use graph_rdb_driver::RdbConnection;
use graph_rdb_model::{Term, Triple, TripleMatch, Variable};
use graph_rdb_query::{Constraint, QueryError, QueryHandler, QueryPlan, QueryResults};
use graph_rdb_storage::{
    ReificationTable, SpecializedGraphReifier, SpecializedGraphTripleStore, StatementTable,
};
use oxrdfio::RdfParser;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// An RDF graph backed by a relational database.
///
/// The graph is composed of two specialized graphs: the reifier, which stores reification
/// triples in a compact form, and the triple store, which accepts every other triple. Writes are
/// offered to them in that order. Which of them take part in reads and writes depends on the
/// configured [ReificationBehavior](graph_rdb_common::ReificationBehavior).
///
/// ```
/// use graph_rdb::config::GraphConfig;
/// use graph_rdb::graph::GraphRdb;
/// use graph_rdb::model::{NamedNode, NodePattern, Triple, TripleMatch, Variable};
///
/// let mut graph = GraphRdb::open_in_memory(GraphConfig::new())?;
/// let ex = |name: &str| NamedNode::new_unchecked(format!("http://example.com/{name}"));
/// graph.add(&Triple::new(ex("a"), ex("knows"), ex("b")))?;
///
/// let pattern = TripleMatch::new(
///     Variable::new_unchecked("x"),
///     ex("knows"),
///     NodePattern::Any,
/// );
/// let solutions = graph.query(&[pattern], &[])?.collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(solutions[0].get("x"), Some(&ex("a").into()));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug)]
pub struct GraphRdb {
    connection: Arc<RdbConnection>,
    config: GraphConfig,
    reifier: SpecializedGraphReifier,
    statements: SpecializedGraphTripleStore,
    closed: bool,
}

impl GraphRdb {
    /// Opens the graph stored in the database file at `path`, creating the tables if needed.
    pub fn open(path: impl AsRef<Path>, config: GraphConfig) -> Result<Self, GraphError> {
        config.validate()?;
        let connection = RdbConnection::open(path, config.driver())?;
        Self::with_connection(Arc::new(connection), config)
    }

    /// Opens a graph in a fresh in-memory database.
    pub fn open_in_memory(config: GraphConfig) -> Result<Self, GraphError> {
        config.validate()?;
        let connection = RdbConnection::open_in_memory(config.driver())?;
        Self::with_connection(Arc::new(connection), config)
    }

    /// Opens a graph on a connection that may be shared with other graphs.
    pub fn with_connection(
        connection: Arc<RdbConnection>,
        config: GraphConfig,
    ) -> Result<Self, GraphError> {
        config.validate()?;
        if connection.driver().kind() != config.driver() {
            return Err(GraphError::InvalidConfig(format!(
                "the connection uses the {} driver but {} is configured",
                connection.driver().kind(),
                config.driver()
            )));
        }
        let statement_table = config.statement_table();
        let reification_table = config.reification_table();
        connection.format_db(&[&statement_table, &reification_table])?;
        connection.set_statement_cache_capacity(config.statement_cache_capacity())?;
        tracing::debug!(
            graph_id = config.graph_id(),
            prefix = config.table_prefix(),
            behavior = %config.reification_behavior(),
            "Opened graph"
        );

        Ok(Self {
            reifier: SpecializedGraphReifier::new(
                ReificationTable::new(Arc::clone(&connection), reification_table),
                config.reification_behavior(),
            ),
            statements: SpecializedGraphTripleStore::new(StatementTable::new(
                Arc::clone(&connection),
                statement_table,
                config.skip_duplicate_check(),
            )),
            connection,
            config,
            closed: false,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn connection(&self) -> &Arc<RdbConnection> {
        &self.connection
    }

    /// Adds a triple to the graph.
    pub fn add(&mut self, triple: &Triple) -> Result<(), GraphError> {
        self.check_open()?;
        let mut complete = CompletionFlag::default();
        for graph in self.write_graphs() {
            graph.add(triple, &mut complete)?;
            if complete.is_done() {
                return Ok(());
            }
        }
        Err(GraphError::NoSuitableStore(triple.clone()))
    }

    /// Adds many triples. Batches are stored in as few transactions as possible.
    pub fn add_all(&mut self, triples: impl IntoIterator<Item = Triple>) -> Result<(), GraphError> {
        self.check_open()?;
        let mut remaining = triples.into_iter().collect::<Vec<_>>();
        for graph in self.write_graphs() {
            if remaining.is_empty() {
                return Ok(());
            }
            let mut complete = CompletionFlag::default();
            graph.add_all(&mut remaining, &mut complete)?;
        }
        match remaining.into_iter().next() {
            None => Ok(()),
            Some(triple) => Err(GraphError::NoSuitableStore(triple)),
        }
    }

    /// Removes a triple from the graph. Missing triples are ignored.
    pub fn delete(&mut self, triple: &Triple) -> Result<(), GraphError> {
        self.check_open()?;
        let mut complete = CompletionFlag::default();
        for graph in self.write_graphs() {
            graph.delete(triple, &mut complete)?;
            if complete.is_done() {
                return Ok(());
            }
        }
        Err(GraphError::NoSuitableStore(triple.clone()))
    }

    /// Removes many triples. Missing triples are ignored.
    pub fn delete_all(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
    ) -> Result<(), GraphError> {
        self.check_open()?;
        let mut remaining = triples.into_iter().collect::<Vec<_>>();
        for graph in self.write_graphs() {
            if remaining.is_empty() {
                return Ok(());
            }
            let mut complete = CompletionFlag::default();
            graph.delete_all(&mut remaining, &mut complete)?;
        }
        match remaining.into_iter().next() {
            None => Ok(()),
            Some(triple) => Err(GraphError::NoSuitableStore(triple)),
        }
    }

    pub fn contains(&self, triple: &Triple) -> Result<bool, GraphError> {
        self.check_open()?;
        let mut complete = CompletionFlag::default();
        for graph in self.read_graphs() {
            if graph.contains(triple, &mut complete)? {
                return Ok(true);
            }
            if complete.is_done() {
                break;
            }
        }
        Ok(false)
    }

    /// Returns every visible triple matching `pattern`. Variables act as wildcards.
    pub fn find(&self, pattern: &TripleMatch) -> Result<Vec<Triple>, GraphError> {
        self.check_open()?;
        let mut complete = CompletionFlag::default();
        let mut triples = Vec::new();
        for graph in self.read_graphs() {
            triples.extend(graph.find(pattern, &mut complete)?);
            if complete.is_done() {
                break;
            }
        }
        Ok(triples)
    }

    /// The number of visible triples.
    pub fn len(&self) -> Result<usize, GraphError> {
        self.check_open()?;
        let mut len = 0;
        for graph in self.read_graphs() {
            len += graph.triple_count()?;
        }
        Ok(len)
    }

    pub fn is_empty(&self) -> Result<bool, GraphError> {
        Ok(self.len()? == 0)
    }

    /// The number of reification triples held by the reifier, hidden or not.
    pub fn reifier_len(&self) -> Result<usize, GraphError> {
        self.check_open()?;
        Ok(self.reifier.triple_count()?)
    }

    /// Removes every triple of the graph, including the hidden ones.
    pub fn clear(&mut self) -> Result<(), GraphError> {
        self.check_open()?;
        self.reifier.clear()?;
        self.statements.clear()?;
        tracing::debug!(graph_id = self.config.graph_id(), "Cleared graph");
        Ok(())
    }

    /// Closes the graph. Every later call fails with [GraphError::Closed].
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Access to the reification operations.
    pub fn reifier(&mut self) -> Result<Reifier<'_>, GraphError> {
        self.check_open()?;
        Ok(Reifier::new(&mut self.reifier))
    }

    /// Evaluates the conjunction of `patterns` and keeps the solutions satisfying every
    /// constraint.
    pub fn query(
        &self,
        patterns: &[TripleMatch],
        constraints: &[Constraint],
    ) -> Result<QueryResults, QueryError> {
        self.query_with_bindings(patterns, constraints, &[])
    }

    /// Like [Self::query], with some variables bound before the query starts.
    pub fn query_with_bindings(
        &self,
        patterns: &[TripleMatch],
        constraints: &[Constraint],
        initial: &[(Variable, Term)],
    ) -> Result<QueryResults, QueryError> {
        Ok(self.plan(patterns, constraints, initial)?.execute())
    }

    /// Evaluates a parsed SPARQL basic graph pattern query.
    pub fn query_basic(&self, query: &BasicQuery) -> Result<QueryResults, QueryError> {
        self.query(query.patterns(), query.constraints())
    }

    /// Describes the stages that [Self::query] would run.
    pub fn explain(
        &self,
        patterns: &[TripleMatch],
        constraints: &[Constraint],
    ) -> Result<String, QueryError> {
        Ok(self.plan(patterns, constraints, &[])?.explain())
    }

    /// Parses `reader` and adds its triples.
    ///
    /// Blank nodes are renamed so that loading the same file twice yields distinct nodes. Quads in
    /// a named graph are rejected. Returns the number of triples read.
    pub fn load_from_reader(
        &mut self,
        parser: impl Into<RdfParser>,
        reader: impl Read,
    ) -> Result<usize, LoaderError> {
        self.check_open()?;
        let mut triples = Vec::new();
        for quad in parser.into().rename_blank_nodes().for_reader(reader) {
            let quad = quad?;
            if !quad.graph_name.is_default_graph() {
                return Err(LoaderError::NamedGraph(quad.graph_name));
            }
            triples.push(Triple::new(quad.subject, quad.predicate, quad.object));
        }
        let count = triples.len();
        self.add_all(triples)?;
        tracing::debug!(count, "Loaded triples");
        Ok(count)
    }

    fn plan(
        &self,
        patterns: &[TripleMatch],
        constraints: &[Constraint],
        initial: &[(Variable, Term)],
    ) -> Result<QueryPlan, QueryError> {
        if self.closed {
            return Err(QueryError::Closed);
        }
        let options = self.config.query_options();
        let graphs: Vec<&dyn SpecializedGraph> = vec![&self.reifier, &self.statements];
        let handler = QueryHandler::new(
            Arc::clone(&self.connection),
            graphs,
            self.config.reification_behavior(),
        )
        .with_options(options)
        .with_pipe_capacity(self.config.pipe_capacity());

        match (patterns, constraints) {
            ([pattern], []) if options.do_fast_path && !options.only_full_reifications => {
                Ok(handler.plan_pattern(pattern, initial))
            }
            _ => handler.plan(patterns, initial, constraints),
        }
    }

    /// The graphs taking part in writes, in the order they are offered a triple.
    fn write_graphs(&mut self) -> Vec<&mut dyn SpecializedGraph> {
        let mut graphs: Vec<&mut dyn SpecializedGraph> = Vec::with_capacity(2);
        if self.config.reification_behavior().reifier_accepts_graph_writes() {
            graphs.push(&mut self.reifier);
        }
        graphs.push(&mut self.statements);
        graphs
    }

    /// The graphs visible to `find`, `contains`, and `len`.
    fn read_graphs(&self) -> Vec<&dyn SpecializedGraph> {
        let mut graphs: Vec<&dyn SpecializedGraph> = Vec::with_capacity(2);
        if self.config.reification_behavior().reifier_visible() {
            graphs.push(&self.reifier);
        }
        graphs.push(&self.statements);
        graphs
    }

    fn check_open(&self) -> Result<(), GraphError> {
        if self.closed {
            Err(GraphError::Closed)
        } else {
            Ok(())
        }
    }
}
