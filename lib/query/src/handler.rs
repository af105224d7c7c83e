use crate::binding::{Binding, VariableMap};
use crate::compiler::{is_reifier_predicate, QueryCompiler};
use crate::constraint::Constraint;
use crate::element::Element;
use crate::error::QueryError;
use crate::options::QueryOptions;
use crate::pattern::{DbPattern, StorageRestriction};
use crate::pipe::{PipeReceiver, DEFAULT_PIPE_CAPACITY};
use crate::query::DbQuery;
use crate::results::QueryResults;
use crate::stage::{DbQueryStage, FilterStage, PatternStage, Stage, StageSequence};
use graph_rdb_common::{ReificationBehavior, SpecializedGraph, SubsumeResult, TableKind};
use graph_rdb_driver::RdbConnection;
use graph_rdb_model::{Term, TripleMatch, Variable};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Plans queries over the specialized graphs of one graph.
///
/// Planning is greedy. The handler repeatedly picks the cheapest remaining pattern, preferring
/// patterns connected to the variables bound so far, and uses it as the seed of a new stage.
/// If the seed can only be answered by one table, every remaining pattern over the same table
/// that shares a variable with the stage is joined into it, and the stage becomes a single SQL
/// statement. The resulting stages run one after the other.
#[derive(Debug)]
pub struct QueryHandler<'a> {
    connection: Arc<RdbConnection>,
    graphs: Vec<&'a dyn SpecializedGraph>,
    behavior: ReificationBehavior,
    options: QueryOptions,
    pipe_capacity: usize,
}

impl<'a> QueryHandler<'a> {
    /// Creates a handler over `graphs`. Their order decides which graph is asked first whether it
    /// subsumes a pattern.
    pub fn new(
        connection: Arc<RdbConnection>,
        graphs: Vec<&'a dyn SpecializedGraph>,
        behavior: ReificationBehavior,
    ) -> Self {
        Self {
            connection,
            graphs,
            behavior,
            options: QueryOptions::for_behavior(behavior),
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_pipe_capacity(mut self, pipe_capacity: usize) -> Self {
        self.pipe_capacity = pipe_capacity;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Plans the conjunction of `patterns`, starting from the values in `initial`, and keeping
    /// only the solutions that satisfy every constraint.
    pub fn plan(
        &self,
        patterns: &[TripleMatch],
        initial: &[(Variable, Term)],
        constraints: &[Constraint],
    ) -> Result<QueryPlan, QueryError> {
        let mut variables = VariableMap::new();
        let binding = Binding::from_pairs(&mut variables, initial.iter().map(|(v, t)| (v, t)));
        let mut remaining = patterns
            .iter()
            .map(|pattern| self.prepare_pattern(pattern, &mut variables, &binding))
            .collect::<Vec<_>>();

        let mut residual = Vec::new();
        for constraint in constraints {
            let index = variables
                .index_of(constraint.variable().as_ref())
                .filter(|index| {
                    binding.is_bound(*index)
                        || remaining
                            .iter()
                            .any(|p| p.var_indices().any(|i| i == *index))
                });
            match index {
                Some(index) => residual.push((index, constraint.clone())),
                None => {
                    return QueryError::internal(format!(
                        "constraint variable {} is not bound by any pattern",
                        constraint.variable()
                    ))
                }
            }
        }

        let cancel = CancellationToken::new();
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        let mut bound = FxHashSet::default();
        while !remaining.is_empty() {
            let seed = remaining.remove(select_next(&remaining, &bound));
            let (stage, group_vars) =
                self.plan_stage(seed, &mut remaining, &bound, &variables, &mut residual, &cancel)?;
            stages.push(stage);
            bound.extend(group_vars);
        }
        if !residual.is_empty() {
            stages.push(Box::new(FilterStage::new(
                residual,
                self.pipe_capacity,
                cancel.clone(),
            )));
        }

        let stage: Box<dyn Stage> = if stages.len() == 1 {
            stages.remove(0)
        } else {
            Box::new(StageSequence::new(stages))
        };
        Ok(QueryPlan {
            stage,
            variables,
            initial: binding,
            cancel,
        })
    }

    /// Plans a single pattern without looking for joins. Used as a fast path for queries of one
    /// constraint-free pattern.
    pub fn plan_pattern(
        &self,
        pattern: &TripleMatch,
        initial: &[(Variable, Term)],
    ) -> QueryPlan {
        let mut variables = VariableMap::new();
        let binding = Binding::from_pairs(&mut variables, initial.iter().map(|(v, t)| (v, t)));
        let pattern = self.prepare_pattern(pattern, &mut variables, &binding);
        let cancel = CancellationToken::new();
        let stage: Box<dyn Stage> = if pattern.sources().is_empty() {
            Box::new(self.empty_stage(&cancel))
        } else {
            Box::new(self.pattern_stage(pattern, &cancel))
        };
        QueryPlan {
            stage,
            variables,
            initial: binding,
            cancel,
        }
    }

    /// Classifies the elements of `pattern` and finds the graphs that may answer it.
    fn prepare_pattern(
        &self,
        pattern: &TripleMatch,
        variables: &mut VariableMap,
        initial: &Binding,
    ) -> DbPattern {
        let mut pattern = DbPattern::new(pattern, variables, initial);
        let restriction = match (self.options.only_asserted, self.options.only_reified) {
            (true, _) => StorageRestriction::AssertedOnly,
            (false, true) => StorageRestriction::ReifiedOnly,
            (false, false) => StorageRestriction::Unrestricted,
        };
        pattern.set_restriction(restriction);

        let question = pattern.to_triple_match();
        for (index, graph) in self.graphs.iter().enumerate() {
            if self.is_excluded(graph.table().kind()) {
                continue;
            }
            match graph.subsumes(&question, self.behavior) {
                SubsumeResult::NoTriples => {}
                SubsumeResult::SomeTriples => pattern.source_add(index),
                SubsumeResult::AllTriples => {
                    pattern.source_add(index);
                    break;
                }
            }
        }
        tracing::trace!(%pattern, sources = ?pattern.sources(), "Prepared pattern");
        pattern
    }

    fn is_excluded(&self, kind: TableKind) -> bool {
        match kind {
            TableKind::Statements => self.options.only_reified,
            TableKind::Reifications => self.options.only_asserted,
        }
    }

    /// Builds the stage seeded by `seed`, joining the patterns of `remaining` that can be
    /// evaluated in the same SQL statement. Returns the stage and the variables it binds.
    fn plan_stage(
        &self,
        mut seed: DbPattern,
        remaining: &mut Vec<DbPattern>,
        bound: &FxHashSet<usize>,
        variables: &VariableMap,
        residual: &mut Vec<(usize, Constraint)>,
        cancel: &CancellationToken,
    ) -> Result<(Box<dyn Stage>, Vec<usize>), QueryError> {
        seed.mark_arguments(bound);
        let seed_vars = seed.var_indices().collect::<Vec<_>>();
        let Some(source) = seed.single_source() else {
            if seed.sources().is_empty() {
                tracing::debug!(pattern = %seed, "No specialized graph can answer the pattern");
                return Ok((Box::new(self.empty_stage(cancel)), seed_vars));
            }
            return Ok((Box::new(self.pattern_stage(seed, cancel)), seed_vars));
        };

        let table = self.graphs[source].table().clone();
        if table.kind() == TableKind::Reifications && !is_reifier_predicate(seed.predicate()) {
            return Ok((Box::new(self.pattern_stage(seed, cancel)), seed_vars));
        }

        let mut group = vec![seed];
        while let Some(position) = remaining
            .iter()
            .position(|candidate| self.joins(candidate, &group, source, table.kind()))
        {
            let mut candidate = remaining.remove(position);
            candidate.mark_arguments(bound);
            tracing::debug!(pattern = %candidate, seed = %group[0], "Joining pattern into stage");
            group.push(candidate);
        }

        let group_vars = group
            .iter()
            .flat_map(DbPattern::var_indices)
            .collect::<Vec<_>>();
        let results = group
            .iter()
            .flat_map(|pattern| pattern.elements().map(|e| e.free_result_index()))
            .flatten()
            .collect::<FxHashSet<_>>();
        let (pushed, kept): (Vec<_>, Vec<_>) = residual
            .drain(..)
            .partition(|(index, _)| results.contains(index));
        *residual = kept;

        let restricted_to_full = self.options.only_full_reifications
            && table.kind() == TableKind::Reifications;
        if group.len() == 1 && pushed.is_empty() && !restricted_to_full {
            let seed = group.remove(0);
            return Ok((Box::new(self.pattern_stage(seed, cancel)), group_vars));
        }

        let pushed = pushed
            .into_iter()
            .map(|(_, constraint)| constraint)
            .collect::<Vec<_>>();
        let query = QueryCompiler::new(
            self.connection.driver().as_ref(),
            self.options.only_full_reifications,
        )
        .compile(Some(&table), variables, &mut group, &pushed)?;
        let stage = DbQueryStage::new(
            query,
            Arc::clone(&self.connection),
            self.pipe_capacity,
            cancel.clone(),
        );
        Ok((Box::new(stage), group_vars))
    }

    /// Whether `candidate` can be evaluated in the same SQL statement as `group`.
    fn joins(
        &self,
        candidate: &DbPattern,
        group: &[DbPattern],
        source: usize,
        kind: TableKind,
    ) -> bool {
        if candidate.single_source() != Some(source) {
            return false;
        }
        let implicit = self.options.do_implicit_join
            && group.iter().any(|p| p.is_implicit_join(candidate));
        let predicate_ok = match kind {
            TableKind::Reifications => is_reifier_predicate(candidate.predicate()),
            TableKind::Statements => {
                !candidate.predicate().is_unrestricted() || self.options.only_asserted || implicit
            }
        };
        if !predicate_ok {
            return false;
        }

        let group_vars = group
            .iter()
            .flat_map(DbPattern::free_vars)
            .collect::<FxHashSet<_>>();
        let shares = |element: &Element| {
            element
                .as_free()
                .is_some_and(|free| group_vars.contains(&free.var_index()))
        };
        shares(candidate.subject())
            || shares(candidate.object())
            || (kind == TableKind::Statements
                && self.options.only_asserted
                && shares(candidate.predicate()))
            || implicit
    }

    fn pattern_stage(&self, pattern: DbPattern, cancel: &CancellationToken) -> PatternStage {
        let sources = pattern
            .sources()
            .iter()
            .map(|index| self.graphs[*index].source())
            .collect();
        PatternStage::new(pattern, sources, self.pipe_capacity, cancel.clone())
    }

    fn empty_stage(&self, cancel: &CancellationToken) -> DbQueryStage {
        DbQueryStage::new(
            DbQuery::empty(),
            Arc::clone(&self.connection),
            self.pipe_capacity,
            cancel.clone(),
        )
    }
}

/// Picks the next seed: the cheapest pattern, where a connected pattern always beats a
/// disconnected one. The first pattern wins ties.
fn select_next(remaining: &[DbPattern], bound: &FxHashSet<usize>) -> usize {
    let mut best: Option<(usize, bool, u32)> = None;
    for (index, pattern) in remaining.iter().enumerate() {
        let connected = pattern.is_connected(bound);
        let cost = pattern.cost(bound);
        let better = match best {
            None => true,
            Some((_, best_connected, best_cost)) => {
                (connected && !best_connected) || (connected == best_connected && cost < best_cost)
            }
        };
        if better {
            best = Some((index, connected, cost));
        }
    }
    best.map_or(0, |(index, _, _)| index)
}

/// A planned query, ready to run.
#[derive(Debug)]
pub struct QueryPlan {
    stage: Box<dyn Stage>,
    variables: VariableMap,
    initial: Binding,
    cancel: CancellationToken,
}

impl QueryPlan {
    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    /// The planned stages, one per line.
    pub fn explain(&self) -> String {
        self.stage.explain()
    }

    /// Starts the stage workers and returns the iterator over their results.
    pub fn execute(self) -> QueryResults {
        let input = PipeReceiver::from_bindings(vec![self.initial], &self.cancel);
        let output = self.stage.deliver(input);
        QueryResults::new(output, &self.variables)
    }
}
