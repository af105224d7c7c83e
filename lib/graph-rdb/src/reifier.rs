use graph_rdb_common::error::{GraphError, StorageError};
use graph_rdb_common::SpecializedGraph;
use graph_rdb_model::{BlankNode, Subject, Triple, TripleMatch};
use graph_rdb_storage::SpecializedGraphReifier;

/// Reification operations on a [GraphRdb](crate::graph::GraphRdb).
///
/// A node `n` reifies a statement `(s p o)` when the graph holds the four triples
/// `(n rdf:subject s)`, `(n rdf:predicate p)`, `(n rdf:object o)`, and
/// `(n rdf:type rdf:Statement)`. These operations see reifications regardless of the reification
/// behavior of the graph.
#[derive(Debug)]
pub struct Reifier<'a> {
    inner: &'a mut SpecializedGraphReifier,
}

impl<'a> Reifier<'a> {
    pub(crate) fn new(inner: &'a mut SpecializedGraphReifier) -> Self {
        Self { inner }
    }

    /// Records that `node` reifies `triple`.
    ///
    /// Fails with [GraphError::AlreadyReified] if `node` already reifies another statement and
    /// with [GraphError::CannotReify] if the fragments already stored for `node` conflict with
    /// `triple`. The graph is left unchanged in both cases.
    pub fn reify_as(
        &mut self,
        node: impl Into<Subject>,
        triple: &Triple,
    ) -> Result<Subject, GraphError> {
        let node = node.into();
        self.inner.reify_as(&node, triple)
    }

    /// Reifies `triple` with a fresh blank node.
    pub fn reify(&mut self, triple: &Triple) -> Result<Subject, GraphError> {
        self.reify_as(BlankNode::default(), triple)
    }

    /// Whether `node` reifies a complete statement.
    pub fn has_node(&self, node: &Subject) -> Result<bool, StorageError> {
        self.inner.has_node(node)
    }

    /// Whether some node reifies `triple`.
    pub fn has_triple(&self, triple: &Triple) -> Result<bool, StorageError> {
        self.inner.has_triple(triple)
    }

    pub fn all_nodes(&self) -> Result<Vec<Subject>, StorageError> {
        self.inner.all_nodes()
    }

    pub fn all_nodes_of(&self, triple: &Triple) -> Result<Vec<Subject>, StorageError> {
        self.inner.all_nodes_of(triple)
    }

    /// Removes the reification of `triple` by `node`.
    pub fn remove(&mut self, node: &Subject, triple: &Triple) -> Result<(), GraphError> {
        self.inner.remove(node, triple)
    }

    /// Removes every reification of `triple`.
    pub fn remove_triple(&mut self, triple: &Triple) -> Result<(), GraphError> {
        self.inner.remove_triple(triple)
    }

    /// The statement reified by `node`, if any.
    pub fn find_reified_triple(&self, node: &Subject) -> Result<Option<Triple>, StorageError> {
        self.inner.find_reified_triple(node)
    }

    /// The reification triples matching `pattern`, including partial reifications.
    pub fn find(&self, pattern: &TripleMatch) -> Result<Vec<Triple>, StorageError> {
        self.inner.find_fragments(pattern)
    }

    /// The number of reification triples.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.inner.triple_count()
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}
