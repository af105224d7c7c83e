//! Bounded pipes connecting query stages.
//!
//! Stages run on plain worker threads and use the blocking halves of a tokio channel. A pipe
//! must therefore never be read or written from inside an async runtime.

use crate::binding::Binding;
use crate::error::QueryError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// The default number of bindings a pipe buffers before its producer blocks.
pub const DEFAULT_PIPE_CAPACITY: usize = 1024;

pub type PipeItem = Result<Binding, QueryError>;

/// Creates a bounded pipe whose ends observe `cancel`.
pub fn pipe(capacity: usize, cancel: &CancellationToken) -> (PipeSender, PipeReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        PipeSender {
            sender,
            cancel: cancel.clone(),
        },
        PipeReceiver {
            receiver,
            cancel: cancel.clone(),
        },
    )
}

/// The producing end of a pipe.
#[derive(Clone, Debug)]
pub struct PipeSender {
    sender: mpsc::Sender<PipeItem>,
    cancel: CancellationToken,
}

impl PipeSender {
    /// Sends `item`, blocking while the pipe is full.
    ///
    /// Returns `false` once the consumer is gone or the query is cancelled. The producer is
    /// expected to stop in that case.
    pub fn send(&self, item: PipeItem) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.sender.blocking_send(item).is_ok()
    }

    /// Sends `item` without blocking. Fails if the pipe is full.
    pub fn try_send(&self, item: PipeItem) -> bool {
        self.sender.try_send(item).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.sender.is_closed()
    }
}

/// The consuming end of a pipe.
#[derive(Debug)]
pub struct PipeReceiver {
    receiver: mpsc::Receiver<PipeItem>,
    cancel: CancellationToken,
}

impl PipeReceiver {
    /// A closed pipe that yields `bindings` and then ends.
    pub fn from_bindings(bindings: Vec<Binding>, cancel: &CancellationToken) -> Self {
        let (sender, receiver) = pipe(bindings.len(), cancel);
        for binding in bindings {
            // The pipe has room for every binding.
            sender.try_send(Ok(binding));
        }
        receiver
    }

    /// Receives the next item, blocking while the pipe is empty.
    ///
    /// Returns `None` once every producer is gone or the query is cancelled.
    pub fn recv(&mut self) -> Option<PipeItem> {
        if self.cancel.is_cancelled() {
            self.receiver.close();
            return None;
        }
        self.receiver.blocking_recv()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Iterator for PipeReceiver {
    type Item = PipeItem;

    fn next(&mut self) -> Option<PipeItem> {
        self.recv()
    }
}
