//! Query stages. Each stage consumes the bindings of its input pipe on its own worker thread
//! and delivers the extended bindings through an output pipe.

mod db;
mod filter;
mod pattern;

pub use db::DbQueryStage;
pub use filter::FilterStage;
pub use pattern::PatternStage;

use crate::binding::Binding;
use crate::error::QueryError;
use crate::pipe::{pipe, PipeReceiver, PipeSender};
use std::fmt::Debug;
use std::thread;
use tokio_util::sync::CancellationToken;

/// A step of a query pipeline.
pub trait Stage: Debug + Send {
    /// Starts the stage on `input` and returns the pipe its results are delivered to.
    fn deliver(self: Box<Self>, input: PipeReceiver) -> PipeReceiver;

    /// A one-line description of the stage.
    fn explain(&self) -> String;
}

/// Runs stages one after the other, each consuming the output of the previous one.
///
/// Without any stage the input is passed through unchanged.
#[derive(Debug, Default)]
pub struct StageSequence {
    stages: Vec<Box<dyn Stage>>,
}

impl StageSequence {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Stage for StageSequence {
    fn deliver(self: Box<Self>, input: PipeReceiver) -> PipeReceiver {
        self.stages
            .into_iter()
            .fold(input, |pipe, stage| stage.deliver(pipe))
    }

    fn explain(&self) -> String {
        self.stages
            .iter()
            .enumerate()
            .map(|(i, stage)| format!("{i}: {}", stage.explain()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Spawns a named worker thread running `body` and returns the receiving end of its output pipe.
///
/// If the thread cannot be spawned, the returned pipe yields a single error.
pub(crate) fn spawn_stage<F>(
    name: &str,
    capacity: usize,
    cancel: &CancellationToken,
    input: PipeReceiver,
    body: F,
) -> PipeReceiver
where
    F: FnOnce(PipeReceiver, PipeSender) + Send + 'static,
{
    let (sender, receiver) = pipe(capacity, cancel);
    let error_sender = sender.clone();
    let spawned = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || body(input, sender));
    if let Err(error) = spawned {
        tracing::error!(%error, stage = name, "Failed to spawn query stage worker");
        error_sender.try_send(Err(QueryError::Internal(format!(
            "failed to spawn the {name} worker: {error}"
        ))));
    }
    receiver
}

/// Feeds every binding of `input` through `step` and forwards the results.
///
/// The stage stops at the end of the input or once the consumer is gone. Errors are forwarded
/// to the consumer and end the stage as well.
pub(crate) fn run_stage<F>(stage: &str, mut input: PipeReceiver, output: &PipeSender, mut step: F)
where
    F: FnMut(Binding) -> Result<Vec<Binding>, QueryError>,
{
    while let Some(item) = input.recv() {
        let binding = match item {
            Ok(binding) => binding,
            Err(error) => {
                output.send(Err(error));
                return;
            }
        };
        match step(binding) {
            Ok(bindings) => {
                for binding in bindings {
                    if !output.send(Ok(binding)) {
                        tracing::trace!(stage, "Consumer is gone, stopping");
                        return;
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, stage, "Query stage failed");
                output.send(Err(error));
                return;
            }
        }
    }
}
