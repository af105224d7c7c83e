use crate::error::{GraphError, StorageError};
use crate::{ReificationBehavior, TableDescriptor};
use graph_rdb_model::{Triple, TripleMatch};
use std::fmt::Debug;
use std::sync::Arc;

/// How completely a specialized graph can answer a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubsumeResult {
    /// The graph cannot contain any triple matching the pattern.
    NoTriples,
    /// The graph may contain some of the triples matching the pattern.
    SomeTriples,
    /// The graph contains every triple matching the pattern. Other graphs need not be asked.
    AllTriples,
}

/// Signals that an operation has been fully handled by a specialized graph and must not be
/// forwarded to the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompletionFlag(bool);

impl CompletionFlag {
    pub fn set_done(&mut self) {
        self.0 = true;
    }

    pub fn is_done(self) -> bool {
        self.0
    }
}

/// Read-only access to the triples of a table.
///
/// Sources are cheap to clone behind an [Arc] and are handed to query stages that run on their
/// own threads.
pub trait TripleSource: Debug + Send + Sync {
    /// Returns every triple matching `pattern`. Variables in `pattern` act as wildcards.
    fn find(&self, pattern: &TripleMatch) -> Result<Vec<Triple>, StorageError>;
}

/// A backing store optimized for one category of triples.
///
/// A graph is composed of an ordered list of specialized graphs. Writes are offered to each of
/// them in turn until one of them sets the [CompletionFlag].
pub trait SpecializedGraph: Debug + Send + Sync {
    /// The table holding the rows of this graph.
    fn table(&self) -> &TableDescriptor;

    /// Returns a read-only view that query stages can hold on to.
    fn source(&self) -> Arc<dyn TripleSource>;

    /// Adds `triple` if this graph is responsible for it. Sets `complete` if it was handled.
    fn add(&mut self, triple: &Triple, complete: &mut CompletionFlag) -> Result<(), GraphError>;

    /// Adds the triples this graph is responsible for and removes them from `triples`.
    ///
    /// `complete` is set if nothing remains.
    fn add_all(
        &mut self,
        triples: &mut Vec<Triple>,
        complete: &mut CompletionFlag,
    ) -> Result<(), GraphError> {
        let mut remaining = Vec::new();
        for triple in std::mem::take(triples) {
            let mut handled = CompletionFlag::default();
            self.add(&triple, &mut handled)?;
            if !handled.is_done() {
                remaining.push(triple);
            }
        }
        if remaining.is_empty() {
            complete.set_done();
        }
        *triples = remaining;
        Ok(())
    }

    /// Deletes `triple` if this graph is responsible for it. Sets `complete` if it was handled.
    fn delete(&mut self, triple: &Triple, complete: &mut CompletionFlag) -> Result<(), GraphError>;

    /// Deletes the triples this graph is responsible for and removes them from `triples`.
    fn delete_all(
        &mut self,
        triples: &mut Vec<Triple>,
        complete: &mut CompletionFlag,
    ) -> Result<(), GraphError> {
        let mut remaining = Vec::new();
        for triple in std::mem::take(triples) {
            let mut handled = CompletionFlag::default();
            self.delete(&triple, &mut handled)?;
            if !handled.is_done() {
                remaining.push(triple);
            }
        }
        if remaining.is_empty() {
            complete.set_done();
        }
        *triples = remaining;
        Ok(())
    }

    /// Returns the triples matching `pattern`. Sets `complete` if no other graph can contain
    /// further matches.
    fn find(
        &self,
        pattern: &TripleMatch,
        complete: &mut CompletionFlag,
    ) -> Result<Vec<Triple>, StorageError>;

    /// Returns whether `triple` is stored in this graph.
    fn contains(&self, triple: &Triple, complete: &mut CompletionFlag) -> Result<bool, StorageError>;

    /// The number of triples in this graph.
    fn triple_count(&self) -> Result<usize, StorageError>;

    /// Tells the planner whether this graph can answer `pattern`.
    fn subsumes(&self, pattern: &TripleMatch, behavior: ReificationBehavior) -> SubsumeResult;

    /// Removes every triple of this graph.
    fn clear(&mut self) -> Result<(), StorageError>;
}
