use crate::binding::{Binding, VariableMap};
use crate::element::Element;
use graph_rdb_model::TripleMatch;
use rustc_hash::FxHashSet;
use std::fmt::{Display, Formatter};

/// The cost of a pattern that matches nearly everything. Costs are capped at this value.
pub const COST_MAX: u32 = 100;

const COST_FIXED: u32 = 1;
const COST_ARGUMENT: u32 = 10;
const COST_FREE: u32 = 30;

/// Which category of storage a pattern may be answered from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageRestriction {
    #[default]
    Unrestricted,
    AssertedOnly,
    ReifiedOnly,
}

/// A triple pattern prepared for planning: its classified elements and the specialized graphs
/// that may contain matching triples.
///
/// A pattern is created once per query and consumed by the planner.
#[derive(Clone, Debug)]
pub struct DbPattern {
    pattern: TripleMatch,
    subject: Element,
    predicate: Element,
    object: Element,
    sources: Vec<usize>,
    restriction: StorageRestriction,
}

impl DbPattern {
    pub fn new(pattern: &TripleMatch, variables: &mut VariableMap, initial: &Binding) -> Self {
        Self {
            subject: Element::classify(&pattern.subject, variables, initial),
            predicate: Element::classify(&pattern.predicate, variables, initial),
            object: Element::classify(&pattern.object, variables, initial),
            pattern: pattern.clone(),
            sources: Vec::new(),
            restriction: StorageRestriction::Unrestricted,
        }
    }

    pub fn pattern(&self) -> &TripleMatch {
        &self.pattern
    }

    pub fn subject(&self) -> &Element {
        &self.subject
    }

    pub fn predicate(&self) -> &Element {
        &self.predicate
    }

    pub fn object(&self) -> &Element {
        &self.object
    }

    pub fn elements(&self) -> [&Element; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    pub fn elements_mut(&mut self) -> [&mut Element; 3] {
        [&mut self.subject, &mut self.predicate, &mut self.object]
    }

    /// The pattern with every variable replaced by a wildcard, as seen by a specialized graph
    /// that is asked whether it can answer it.
    pub fn to_triple_match(&self) -> TripleMatch {
        TripleMatch::new(
            self.subject.to_node_pattern(),
            self.predicate.to_node_pattern(),
            self.object.to_node_pattern(),
        )
    }

    /// Records that the specialized graph `source` may contain matching triples.
    pub fn source_add(&mut self, source: usize) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    pub fn sources(&self) -> &[usize] {
        &self.sources
    }

    pub fn single_source(&self) -> Option<usize> {
        match self.sources.as_slice() {
            [source] => Some(*source),
            _ => None,
        }
    }

    pub fn restriction(&self) -> StorageRestriction {
        self.restriction
    }

    pub fn set_restriction(&mut self, restriction: StorageRestriction) {
        self.restriction = restriction;
    }

    /// The relative cost of evaluating the pattern once the variables in `bound` are known.
    ///
    /// Constants are the most selective, then variables whose value is provided by the caller
    /// or an earlier stage, then unbound variables and wildcards. A pattern without any source
    /// costs nothing as it never yields a row.
    pub fn cost(&self, bound: &FxHashSet<usize>) -> u32 {
        if self.sources.is_empty() {
            return 0;
        }
        self.elements()
            .into_iter()
            .map(|element| element_cost(element, bound))
            .sum::<u32>()
            .min(COST_MAX)
    }

    /// Whether one of the free variables of the pattern is in `bound`.
    pub fn is_connected(&self, bound: &FxHashSet<usize>) -> bool {
        self.free_vars().any(|index| bound.contains(&index))
    }

    /// The slots of the free variables of the pattern.
    pub fn free_vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.elements()
            .into_iter()
            .filter_map(|element| element.as_free().map(|free| free.var_index()))
    }

    /// The slots of every variable of the pattern, free or bound.
    pub fn var_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.elements().into_iter().filter_map(Element::var_index)
    }

    /// Turns the free variables in `bound` into arguments.
    pub fn mark_arguments(&mut self, bound: &FxHashSet<usize>) {
        for element in self.elements_mut() {
            if element
                .as_free()
                .is_some_and(|free| bound.contains(&free.var_index()))
            {
                element.mark_arg();
            }
        }
    }

    /// Two patterns with the same constant subject can share a table alias scan even without a
    /// common variable.
    pub fn is_implicit_join(&self, other: &DbPattern) -> bool {
        match (self.subject.as_constant(), other.subject.as_constant()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

fn element_cost(element: &Element, bound: &FxHashSet<usize>) -> u32 {
    match element {
        Element::Fixed(_) => COST_FIXED,
        Element::Bound { .. } => COST_ARGUMENT,
        Element::Free(free) if free.is_arg() || bound.contains(&free.var_index()) => COST_ARGUMENT,
        Element::Free(_) | Element::Any => COST_FREE,
    }
}

impl Display for DbPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_rdb_model::{NamedNode, NodePattern, Variable};

    fn ex(name: &str) -> NodePattern {
        NodePattern::Term(NamedNode::new_unchecked(format!("http://example.com/{name}")).into())
    }

    fn var(name: &str) -> NodePattern {
        NodePattern::Variable(Variable::new_unchecked(name))
    }

    fn pattern(s: NodePattern, p: NodePattern, o: NodePattern) -> DbPattern {
        let mut pattern = DbPattern::new(
            &TripleMatch::new(s, p, o),
            &mut VariableMap::new(),
            &Binding::new(),
        );
        pattern.source_add(0);
        pattern
    }

    #[test]
    fn cost_ordering() {
        let none = FxHashSet::default();
        let all_fixed = pattern(ex("s"), ex("p"), ex("o")).cost(&none);
        let one_variable = pattern(var("x"), ex("p"), ex("o")).cost(&none);
        let two_free = pattern(var("x"), ex("p"), var("y")).cost(&none);
        let all_free = pattern(var("x"), NodePattern::Any, var("y")).cost(&none);

        assert!(all_fixed < one_variable);
        assert!(one_variable < two_free);
        assert!(two_free < all_free);
        assert!(all_free <= COST_MAX);
    }

    #[test]
    fn bound_variables_are_cheaper() {
        let candidate = pattern(var("x"), ex("p"), var("y"));
        let unbound = candidate.cost(&FxHashSet::default());
        let bound = candidate.cost(&FxHashSet::from_iter([0]));

        assert!(bound < unbound);
        assert!(candidate.is_connected(&FxHashSet::from_iter([0])));
        assert!(!candidate.is_connected(&FxHashSet::from_iter([5])));
    }

    #[test]
    fn pattern_without_source_costs_nothing() {
        let candidate = DbPattern::new(
            &TripleMatch::any(),
            &mut VariableMap::new(),
            &Binding::new(),
        );
        assert_eq!(candidate.cost(&FxHashSet::default()), 0);
    }

    #[test]
    fn marking_arguments() {
        let mut candidate = pattern(var("x"), ex("p"), var("y"));
        candidate.mark_arguments(&FxHashSet::from_iter([1]));

        assert_eq!(candidate.to_string(), "(?x <http://example.com/p> ?y(arg))");
        assert_eq!(candidate.free_vars().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn implicit_join_on_constant_subject() {
        let first = pattern(ex("s"), ex("p1"), var("x"));
        let second = pattern(ex("s"), ex("p2"), var("y"));
        let third = pattern(ex("t"), ex("p2"), var("y"));

        assert!(first.is_implicit_join(&second));
        assert!(!first.is_implicit_join(&third));
    }
}
