use crate::reification::{
    ReificationCache, ReificationCacheEntry, ReificationComponent, ReificationRow,
    ReificationTable,
};
use graph_rdb_common::error::{GraphError, StorageError};
use graph_rdb_common::{
    CompletionFlag, ReificationBehavior, SpecializedGraph, SubsumeResult, TableDescriptor,
    TripleSource,
};
use graph_rdb_model::vocab::rdf;
use graph_rdb_model::{NodePattern, Subject, Term, TermRef, Triple, TripleMatch};
use itertools::Itertools;
use rusqlite::Connection;
use std::sync::Arc;

/// The specialized graph storing reification fragments.
///
/// The four triples `(n rdf:subject s)`, `(n rdf:predicate p)`, `(n rdf:object o)`, and
/// `(n rdf:type rdf:Statement)` are stored in a single row of the reification table when possible.
/// Fragments that conflict with each other are kept in separate rows of the same node.
///
/// Per node, the rows move through the following states:
/// - *Empty*: no row.
/// - *Partial*: one row holding one to three components.
/// - *Complete*: one row holding all four components.
/// - *Multi-fragment*: two or more rows.
#[derive(Debug)]
pub struct SpecializedGraphReifier {
    fragments: Arc<ReificationTable>,
    cache: ReificationCache,
    behavior: ReificationBehavior,
}

impl SpecializedGraphReifier {
    pub fn new(fragments: ReificationTable, behavior: ReificationBehavior) -> Self {
        Self {
            fragments: Arc::new(fragments),
            cache: ReificationCache::default(),
            behavior,
        }
    }

    pub fn fragments(&self) -> &ReificationTable {
        &self.fragments
    }

    pub fn behavior(&self) -> ReificationBehavior {
        self.behavior
    }

    /// Records that `node` reifies `triple`.
    ///
    /// Missing components of an existing partial reification are filled in. Fails with
    /// [GraphError::AlreadyReified] if `node` reifies another statement and with
    /// [GraphError::CannotReify] if its existing fragments conflict with `triple`.
    pub fn reify_as(&mut self, node: &Subject, triple: &Triple) -> Result<Subject, GraphError> {
        self.write(node, |reifier, conn| reifier.add_statement(conn, node, triple))?;
        Ok(node.clone())
    }

    /// Whether `node` reifies a complete statement.
    pub fn has_node(&self, node: &Subject) -> Result<bool, StorageError> {
        Ok(self.find_reified_triple(node)?.is_some())
    }

    /// Whether some node reifies `triple`.
    pub fn has_triple(&self, triple: &Triple) -> Result<bool, StorageError> {
        Ok(!self.all_nodes_of(triple)?.is_empty())
    }

    /// The nodes reifying a complete statement.
    pub fn all_nodes(&self) -> Result<Vec<Subject>, StorageError> {
        self.complete_nodes(None)
    }

    /// The nodes reifying `triple`.
    pub fn all_nodes_of(&self, triple: &Triple) -> Result<Vec<Subject>, StorageError> {
        self.complete_nodes(Some(triple))
    }

    /// Removes the reification of `triple` by `node`. Components of `node` that differ from
    /// `triple` are left untouched.
    pub fn remove(&mut self, node: &Subject, triple: &Triple) -> Result<(), GraphError> {
        let wanted = ReificationRow::complete(node, triple);
        self.write(node, |reifier, conn| {
            let mut modified = false;
            for component in ReificationComponent::ALL {
                if let Some(value) = wanted.value(component) {
                    modified |= reifier.delete_fragment(conn, node, component, value.as_ref())?;
                }
            }
            Ok(modified)
        })
    }

    /// Removes every reification of `triple`.
    pub fn remove_triple(&mut self, triple: &Triple) -> Result<(), GraphError> {
        for node in self.all_nodes_of(triple)? {
            self.remove(&node, triple)?;
        }
        Ok(())
    }

    /// The statement reified by `node`, if its reification is complete.
    pub fn find_reified_triple(&self, node: &Subject) -> Result<Option<Triple>, StorageError> {
        if let Some(entry) = self.cache.get(node) {
            if !entry.mask().is_complete() {
                return Ok(None);
            }
        }
        let rows = self
            .fragments
            .connection()
            .with_connection(|conn| self.fragments.rows_for_node(conn, node))?;
        Ok(rows.iter().find_map(ReificationRow::triple))
    }

    /// The fragment triples matching `pattern`.
    pub fn find_fragments(&self, pattern: &TripleMatch) -> Result<Vec<Triple>, StorageError> {
        self.fragments.find(pattern)
    }

    fn complete_nodes(&self, triple: Option<&Triple>) -> Result<Vec<Subject>, StorageError> {
        let rows = self
            .fragments
            .connection()
            .with_connection(|conn| self.fragments.complete_rows(conn, triple))?;
        Ok(rows.into_iter().map(|row| row.node).unique().collect())
    }

    /// Runs `op` in a transaction. The cache entry of `node` is dropped unless `op` reports that
    /// it did not modify anything.
    fn write(
        &mut self,
        node: &Subject,
        op: impl FnOnce(&mut Self, &Connection) -> Result<bool, GraphError>,
    ) -> Result<(), GraphError> {
        let connection = Arc::clone(self.fragments.connection());
        let result = connection.with_transaction(|tx| op(self, &**tx));
        match &result {
            Ok(false)
            | Err(GraphError::AlreadyReified { .. } | GraphError::CannotReify { .. }) => {}
            _ => self.cache.invalidate(node),
        }
        result.map(|_| ())
    }

    /// The merged state of `node`, scanning its rows on a cache miss.
    fn state(
        &mut self,
        conn: &Connection,
        node: &Subject,
    ) -> Result<ReificationCacheEntry, StorageError> {
        if let Some(entry) = self.cache.get(node) {
            return Ok(entry.clone());
        }
        let rows = self.fragments.rows_for_node(conn, node)?;
        Ok(self.cache.load(node, &rows).clone())
    }

    /// Adds a single fragment. Returns false if it was already stored.
    fn add_fragment(
        &mut self,
        conn: &Connection,
        node: &Subject,
        component: ReificationComponent,
        value: &Term,
    ) -> Result<bool, GraphError> {
        let state = self.state(conn, node)?;
        let fragment = ReificationRow::fragment(node, component, value.clone());

        if state.row_count() == 0 {
            self.fragments.insert_row(conn, &fragment)?;
            return Ok(true);
        }

        if state.mask().contains(component) {
            let duplicate = component == ReificationComponent::Type
                || self
                    .fragments
                    .row_with_fragment(conn, node, component, value.as_ref())?
                    .is_some();
            if duplicate {
                return Ok(false);
            }
            if state.mask().is_complete() {
                tracing::debug!(%node, %value, ?component, "Node already reifies a complete statement");
                return Err(GraphError::AlreadyReified {
                    node: node.clone().into(),
                });
            }
            self.fragments.insert_row(conn, &fragment)?;
            return Ok(true);
        }

        if state.row_count() == 1 {
            let Some(mut row) = self.fragments.rows_for_node(conn, node)?.pop() else {
                return GraphError::internal(format!("the reification rows of {node} vanished"));
            };
            row.set(component, Some(value.clone()));
            self.fragments.update_row(conn, &row)?;
        } else {
            self.fragments.insert_row(conn, &fragment)?;
            self.compact(conn, node)?;
        }
        Ok(true)
    }

    /// Adds all four components of `triple`. Returns false if `node` already reifies `triple`.
    fn add_statement(
        &mut self,
        conn: &Connection,
        node: &Subject,
        triple: &Triple,
    ) -> Result<bool, GraphError> {
        let wanted = ReificationRow::complete(node, triple);
        let rows = self.fragments.rows_for_node(conn, node)?;
        let Some(first) = rows.first() else {
            self.fragments.insert_row(conn, &wanted)?;
            return Ok(true);
        };

        let conflicts = rows.iter().any(|row| {
            ReificationComponent::ALL.into_iter().any(|component| {
                row.value(component)
                    .is_some_and(|value| Some(value) != wanted.value(component))
            })
        });
        let existing = ReificationCacheEntry::from_rows(node.clone(), &rows);
        if conflicts {
            tracing::debug!(%node, %triple, mask = %existing.mask(), "Cannot reify statement");
            return Err(if existing.mask().is_complete() {
                GraphError::AlreadyReified {
                    node: node.clone().into(),
                }
            } else {
                GraphError::CannotReify {
                    node: node.clone().into(),
                    triple: triple.clone(),
                }
            });
        }
        if existing.mask().is_complete() {
            return Ok(false);
        }

        let mut target = rows
            .iter()
            .find(|row| row.has_type)
            .unwrap_or(first)
            .clone();
        for component in ReificationComponent::ALL {
            if !existing.mask().contains(component) {
                target.set(component, wanted.value(component));
            }
        }
        self.fragments.update_row(conn, &target)?;
        self.compact(conn, node)?;
        Ok(true)
    }

    /// Folds the rows of `node` into the row carrying the type marker, as long as they do not
    /// conflict with it.
    fn compact(&mut self, conn: &Connection, node: &Subject) -> Result<(), GraphError> {
        let rows = self.fragments.rows_for_node(conn, node)?;
        let mut typed = rows.iter().filter(|row| row.has_type);
        let Some(target) = typed.next() else {
            return Ok(());
        };
        if typed.next().is_some() {
            return GraphError::internal(format!(
                "{node} has more than one reification row with a type"
            ));
        }

        let mut target = target.clone();
        let target_id = target.row_id;
        let mut merged = 0;
        for row in rows.iter().filter(|row| row.row_id != target_id) {
            if !row.mask().intersects(target.mask()) {
                target.absorb(row);
                self.fragments.delete_row(conn, row.row_id)?;
                merged += 1;
            } else if row.is_covered_by(&target) {
                self.fragments.delete_row(conn, row.row_id)?;
            } else {
                break;
            }
        }
        if merged > 0 {
            self.fragments.update_row(conn, &target)?;
        }
        tracing::trace!(%node, merged, mask = %target.mask(), "Compacted reification rows");
        Ok(())
    }

    /// Removes a single fragment. Returns false if it was not stored.
    fn delete_fragment(
        &mut self,
        conn: &Connection,
        node: &Subject,
        component: ReificationComponent,
        value: TermRef<'_>,
    ) -> Result<bool, GraphError> {
        let Some(mut row) = self
            .fragments
            .row_with_fragment(conn, node, component, value)?
        else {
            return Ok(false);
        };
        if row.mask().component_count() == 1 {
            self.fragments.delete_row(conn, row.row_id)?;
        } else {
            row.set(component, None);
            self.fragments.update_row(conn, &row)?;
            self.compact(conn, node)?;
        }
        Ok(true)
    }
}

impl SpecializedGraph for SpecializedGraphReifier {
    fn table(&self) -> &TableDescriptor {
        self.fragments.table()
    }

    fn source(&self) -> Arc<dyn TripleSource> {
        Arc::clone(&self.fragments) as Arc<dyn TripleSource>
    }

    fn add(&mut self, triple: &Triple, complete: &mut CompletionFlag) -> Result<(), GraphError> {
        let Some(component) =
            ReificationComponent::of_fragment(triple.predicate.as_ref(), triple.object.as_ref())
        else {
            return Ok(());
        };
        let node = triple.subject.clone();
        self.write(&node, |reifier, conn| {
            reifier.add_fragment(conn, &node, component, &triple.object)
        })?;
        complete.set_done();
        Ok(())
    }

    fn delete(&mut self, triple: &Triple, complete: &mut CompletionFlag) -> Result<(), GraphError> {
        let Some(component) =
            ReificationComponent::of_fragment(triple.predicate.as_ref(), triple.object.as_ref())
        else {
            return Ok(());
        };
        let node = triple.subject.clone();
        self.write(&node, |reifier, conn| {
            reifier.delete_fragment(conn, &node, component, triple.object.as_ref())
        })?;
        complete.set_done();
        Ok(())
    }

    fn find(
        &self,
        pattern: &TripleMatch,
        complete: &mut CompletionFlag,
    ) -> Result<Vec<Triple>, StorageError> {
        let triples = self.find_fragments(pattern)?;
        if self.subsumes(pattern, self.behavior) == SubsumeResult::AllTriples {
            complete.set_done();
        }
        Ok(triples)
    }

    fn contains(&self, triple: &Triple, complete: &mut CompletionFlag) -> Result<bool, StorageError> {
        let Some(component) =
            ReificationComponent::of_fragment(triple.predicate.as_ref(), triple.object.as_ref())
        else {
            return Ok(false);
        };
        if self.behavior != ReificationBehavior::HideOnlyFull {
            complete.set_done();
        }
        let row = self.fragments.connection().with_connection(|conn| {
            self.fragments
                .row_with_fragment(conn, &triple.subject, component, triple.object.as_ref())
        })?;
        Ok(row.is_some())
    }

    fn triple_count(&self) -> Result<usize, StorageError> {
        self.fragments
            .connection()
            .with_connection(|conn| self.fragments.fragment_count(conn))
    }

    fn subsumes(&self, pattern: &TripleMatch, behavior: ReificationBehavior) -> SubsumeResult {
        let all = if behavior == ReificationBehavior::HideOnlyFull {
            SubsumeResult::SomeTriples
        } else {
            SubsumeResult::AllTriples
        };
        let predicate = match &pattern.predicate {
            NodePattern::Term(Term::NamedNode(predicate)) => predicate.as_ref(),
            NodePattern::Term(_) => return SubsumeResult::NoTriples,
            NodePattern::Variable(_) | NodePattern::Any => return SubsumeResult::SomeTriples,
        };
        match ReificationComponent::of_predicate(predicate) {
            Some(ReificationComponent::Type) => match pattern.object.as_term() {
                Some(object) if object.as_ref() == TermRef::from(rdf::STATEMENT) => all,
                Some(_) => SubsumeResult::NoTriples,
                None => SubsumeResult::SomeTriples,
            },
            Some(_) => all,
            None => SubsumeResult::NoTriples,
        }
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        let removed = self
            .fragments
            .connection()
            .with_connection(|conn| self.fragments.remove_all(conn))?;
        self.cache.flush();
        tracing::debug!(removed, "Cleared reification rows");
        Ok(())
    }
}
