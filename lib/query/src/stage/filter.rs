use crate::constraint::Constraint;
use crate::pipe::PipeReceiver;
use crate::stage::{run_stage, spawn_stage, Stage};
use itertools::Itertools;
use tokio_util::sync::CancellationToken;

/// Drops the bindings that violate a constraint.
#[derive(Debug)]
pub struct FilterStage {
    /// Constraints together with the slot of their variable.
    constraints: Vec<(usize, Constraint)>,
    capacity: usize,
    cancel: CancellationToken,
}

impl FilterStage {
    pub fn new(
        constraints: Vec<(usize, Constraint)>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            constraints,
            capacity,
            cancel,
        }
    }
}

impl Stage for FilterStage {
    fn deliver(self: Box<Self>, input: PipeReceiver) -> PipeReceiver {
        let FilterStage {
            constraints,
            capacity,
            cancel,
        } = *self;
        spawn_stage(
            "graph-rdb-filter-stage",
            capacity,
            &cancel,
            input,
            move |input, output| {
                run_stage("filter", input, &output, |binding| {
                    let keep = constraints
                        .iter()
                        .all(|(index, constraint)| constraint.evaluate(binding.get(*index)));
                    Ok(if keep { vec![binding] } else { Vec::new() })
                });
            },
        )
    }

    fn explain(&self) -> String {
        format!(
            "filter: {}",
            self.constraints.iter().map(|(_, c)| c).join(" && ")
        )
    }
}
