use crate::binding::Binding;
use crate::element::Element;
use crate::error::QueryError;
use crate::pattern::DbPattern;
use crate::pipe::PipeReceiver;
use crate::stage::{run_stage, spawn_stage, Stage};
use graph_rdb_common::TripleSource;
use graph_rdb_model::{Term, TripleMatch};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Evaluates a single pattern by asking each of its sources for the matching triples.
///
/// This is the fallback for patterns that cannot be compiled into SQL, e.g. because several
/// specialized graphs may hold matching triples.
#[derive(Debug)]
pub struct PatternStage {
    pattern: DbPattern,
    sources: Vec<Arc<dyn TripleSource>>,
    capacity: usize,
    cancel: CancellationToken,
}

impl PatternStage {
    pub fn new(
        pattern: DbPattern,
        sources: Vec<Arc<dyn TripleSource>>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pattern,
            sources,
            capacity,
            cancel,
        }
    }
}

impl Stage for PatternStage {
    fn deliver(self: Box<Self>, input: PipeReceiver) -> PipeReceiver {
        let PatternStage {
            pattern,
            sources,
            capacity,
            cancel,
        } = *self;
        spawn_stage(
            "graph-rdb-pattern-stage",
            capacity,
            &cancel,
            input,
            move |input, output| {
                run_stage("pattern", input, &output, |binding| {
                    evaluate(&pattern, &sources, &binding)
                });
            },
        )
    }

    fn explain(&self) -> String {
        format!(
            "pattern: {} over {} source(s)",
            self.pattern,
            self.sources.len()
        )
    }
}

fn evaluate(
    pattern: &DbPattern,
    sources: &[Arc<dyn TripleSource>],
    binding: &Binding,
) -> Result<Vec<Binding>, QueryError> {
    let [subject, predicate, object] = pattern.elements();
    let query = TripleMatch::new(
        subject.substitute(binding),
        predicate.substitute(binding),
        object.substitute(binding),
    );
    let mut results = Vec::new();
    for source in sources {
        for triple in source.find(&query)? {
            let mut result = binding.clone();
            if bind(&mut result, subject, triple.subject.into())
                && bind(&mut result, predicate, triple.predicate.into())
                && bind(&mut result, object, triple.object)
            {
                results.push(result);
            }
        }
    }
    Ok(results)
}

/// Binds the variable of `element` to `value`. Fails if it already holds another value, which
/// happens when a variable occurs twice in the pattern.
fn bind(binding: &mut Binding, element: &Element, value: Term) -> bool {
    let Some(index) = element.var_index() else {
        return true;
    };
    match binding.get(index) {
        Some(existing) => *existing == value,
        None => {
            binding.set(index, value);
            true
        }
    }
}
