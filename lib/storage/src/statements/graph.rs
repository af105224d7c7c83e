use crate::statements::StatementTable;
use graph_rdb_common::error::{GraphError, StorageError};
use graph_rdb_common::{
    CompletionFlag, ReificationBehavior, SpecializedGraph, SubsumeResult, TableDescriptor,
    TripleSource,
};
use graph_rdb_model::{Triple, TripleMatch};
use std::sync::Arc;

/// The specialized graph for asserted statements. It accepts every triple.
#[derive(Debug)]
pub struct SpecializedGraphTripleStore {
    statements: Arc<StatementTable>,
}

impl SpecializedGraphTripleStore {
    pub fn new(statements: StatementTable) -> Self {
        Self {
            statements: Arc::new(statements),
        }
    }

    pub fn statements(&self) -> &StatementTable {
        &self.statements
    }
}

impl SpecializedGraph for SpecializedGraphTripleStore {
    fn table(&self) -> &TableDescriptor {
        self.statements.table()
    }

    fn source(&self) -> Arc<dyn TripleSource> {
        Arc::clone(&self.statements) as Arc<dyn TripleSource>
    }

    fn add(&mut self, triple: &Triple, complete: &mut CompletionFlag) -> Result<(), GraphError> {
        self.statements.store_triple(triple)?;
        complete.set_done();
        Ok(())
    }

    fn add_all(
        &mut self,
        triples: &mut Vec<Triple>,
        complete: &mut CompletionFlag,
    ) -> Result<(), GraphError> {
        self.statements.store_triples(triples)?;
        triples.clear();
        complete.set_done();
        Ok(())
    }

    fn delete(&mut self, triple: &Triple, complete: &mut CompletionFlag) -> Result<(), GraphError> {
        self.statements.delete_triple(triple)?;
        complete.set_done();
        Ok(())
    }

    fn delete_all(
        &mut self,
        triples: &mut Vec<Triple>,
        complete: &mut CompletionFlag,
    ) -> Result<(), GraphError> {
        self.statements.delete_triples(triples)?;
        triples.clear();
        complete.set_done();
        Ok(())
    }

    fn find(
        &self,
        pattern: &TripleMatch,
        _complete: &mut CompletionFlag,
    ) -> Result<Vec<Triple>, StorageError> {
        self.statements.find(pattern)
    }

    fn contains(&self, triple: &Triple, complete: &mut CompletionFlag) -> Result<bool, StorageError> {
        let found = self.statements.contains(triple)?;
        if found {
            complete.set_done();
        }
        Ok(found)
    }

    fn triple_count(&self) -> Result<usize, StorageError> {
        self.statements.triple_count()
    }

    fn subsumes(&self, _pattern: &TripleMatch, _behavior: ReificationBehavior) -> SubsumeResult {
        SubsumeResult::SomeTriples
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.statements.remove_statements()?;
        Ok(())
    }
}
