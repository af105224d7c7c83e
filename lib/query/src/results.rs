use crate::binding::{QuerySolution, VariableMap};
use crate::error::QueryError;
use crate::pipe::PipeReceiver;
use graph_rdb_model::Variable;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// An iterator over the solutions of a running query.
///
/// Dropping the iterator cancels the query and stops every stage worker.
#[derive(Debug)]
pub struct QueryResults {
    receiver: PipeReceiver,
    variables: Arc<[Variable]>,
    cancel: CancellationToken,
}

impl QueryResults {
    pub(crate) fn new(receiver: PipeReceiver, variables: &VariableMap) -> Self {
        Self {
            cancel: receiver.cancellation_token().clone(),
            receiver,
            variables: variables.variables().into(),
        }
    }

    /// Every variable of the query, in slot order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Stops the query. The iterator ends afterward.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Iterator for QueryResults {
    type Item = Result<QuerySolution, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.receiver.recv()?;
        Some(item.map(|binding| QuerySolution::new(Arc::clone(&self.variables), binding)))
    }
}

impl Drop for QueryResults {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
