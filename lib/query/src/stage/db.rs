use crate::pipe::PipeReceiver;
use crate::query::DbQuery;
use crate::stage::{run_stage, spawn_stage, Stage};
use graph_rdb_driver::RdbConnection;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a compiled SQL statement once per incoming binding.
#[derive(Debug)]
pub struct DbQueryStage {
    query: DbQuery,
    connection: Arc<RdbConnection>,
    capacity: usize,
    cancel: CancellationToken,
}

impl DbQueryStage {
    pub fn new(
        query: DbQuery,
        connection: Arc<RdbConnection>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            query,
            connection,
            capacity,
            cancel,
        }
    }

    pub fn query(&self) -> &DbQuery {
        &self.query
    }
}

impl Stage for DbQueryStage {
    fn deliver(self: Box<Self>, input: PipeReceiver) -> PipeReceiver {
        let DbQueryStage {
            query,
            connection,
            capacity,
            cancel,
        } = *self;
        spawn_stage(
            "graph-rdb-sql-stage",
            capacity,
            &cancel,
            input,
            move |input, output| {
                run_stage("sql", input, &output, |binding| {
                    query.execute(&connection, &binding)
                });
            },
        )
    }

    fn explain(&self) -> String {
        if self.query.is_empty() {
            "empty".to_owned()
        } else {
            format!("sql: {}", self.query.sql())
        }
    }
}
