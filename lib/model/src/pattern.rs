use crate::BlankNodeMatchingMode;
use oxrdf::{
    BlankNode, Literal, NamedNode, NamedNodeRef, Subject, Term, TermRef, Triple, TripleRef,
    Variable,
};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use std::fmt::{Display, Formatter};

/// A single position (subject, predicate, or object) of a [TripleMatch].
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum NodePattern {
    /// Matches every term and does not bind anything.
    #[default]
    Any,
    /// Matches exactly this term.
    Term(Term),
    /// Matches every term and binds it to the variable.
    Variable(Variable),
}

impl NodePattern {
    /// Returns the constant term, if this position holds one.
    pub fn as_term(&self) -> Option<&Term> {
        match self {
            NodePattern::Term(term) => Some(term),
            _ => None,
        }
    }

    /// Returns the variable, if this position holds one.
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            NodePattern::Variable(var) => Some(var),
            _ => None,
        }
    }

    /// Returns whether this position is [NodePattern::Any].
    pub fn is_any(&self) -> bool {
        matches!(self, NodePattern::Any)
    }

    /// Returns whether `term` is matched by this position. Variables match everything.
    pub fn matches(&self, term: TermRef<'_>) -> bool {
        match self {
            NodePattern::Term(expected) => expected.as_ref() == term,
            NodePattern::Any | NodePattern::Variable(_) => true,
        }
    }

    /// Replaces a variable with [NodePattern::Any]. Constants are kept.
    #[must_use]
    pub fn without_variable(&self) -> Self {
        match self {
            NodePattern::Variable(_) => NodePattern::Any,
            other => other.clone(),
        }
    }

    fn from_term_pattern(pattern: &TermPattern, mode: BlankNodeMatchingMode) -> Self {
        match pattern {
            TermPattern::NamedNode(nn) => NodePattern::Term(nn.clone().into()),
            TermPattern::Literal(lit) => NodePattern::Term(lit.clone().into()),
            TermPattern::BlankNode(bnode) => match mode {
                BlankNodeMatchingMode::Variable => NodePattern::Variable(
                    Variable::new_unchecked(format!("_{}", bnode.as_str())),
                ),
                BlankNodeMatchingMode::Filter => NodePattern::Term(bnode.clone().into()),
            },
            TermPattern::Variable(var) => NodePattern::Variable(var.clone()),
        }
    }
}

impl Display for NodePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodePattern::Any => f.write_str("ANY"),
            NodePattern::Term(term) => term.fmt(f),
            NodePattern::Variable(var) => var.fmt(f),
        }
    }
}

impl From<Term> for NodePattern {
    fn from(term: Term) -> Self {
        NodePattern::Term(term)
    }
}

impl From<NamedNode> for NodePattern {
    fn from(nn: NamedNode) -> Self {
        NodePattern::Term(nn.into())
    }
}

impl From<NamedNodeRef<'_>> for NodePattern {
    fn from(nn: NamedNodeRef<'_>) -> Self {
        NodePattern::Term(nn.into_owned().into())
    }
}

impl From<BlankNode> for NodePattern {
    fn from(bnode: BlankNode) -> Self {
        NodePattern::Term(bnode.into())
    }
}

impl From<Literal> for NodePattern {
    fn from(lit: Literal) -> Self {
        NodePattern::Term(lit.into())
    }
}

impl From<Subject> for NodePattern {
    fn from(subject: Subject) -> Self {
        NodePattern::Term(subject.into())
    }
}

impl From<Variable> for NodePattern {
    fn from(var: Variable) -> Self {
        NodePattern::Variable(var)
    }
}

impl<T: Into<NodePattern>> From<Option<T>> for NodePattern {
    fn from(value: Option<T>) -> Self {
        value.map_or(NodePattern::Any, Into::into)
    }
}

/// A triple whose positions may be constants, variables, or wildcards.
///
/// A [TripleMatch] without variables is what a storage layer is asked to `find`. With variables
/// it is the unit of a query.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct TripleMatch {
    pub subject: NodePattern,
    pub predicate: NodePattern,
    pub object: NodePattern,
}

impl TripleMatch {
    /// Creates a new [TripleMatch].
    pub fn new(
        subject: impl Into<NodePattern>,
        predicate: impl Into<NodePattern>,
        object: impl Into<NodePattern>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// A match that accepts every triple.
    pub fn any() -> Self {
        Self::default()
    }

    /// Converts a SPARQL triple pattern.
    pub fn from_pattern(pattern: &TriplePattern, mode: BlankNodeMatchingMode) -> Self {
        let predicate = match &pattern.predicate {
            NamedNodePattern::NamedNode(nn) => NodePattern::Term(nn.clone().into()),
            NamedNodePattern::Variable(var) => NodePattern::Variable(var.clone()),
        };
        Self {
            subject: NodePattern::from_term_pattern(&pattern.subject, mode),
            predicate,
            object: NodePattern::from_term_pattern(&pattern.object, mode),
        }
    }

    /// The subject, predicate and object positions in this order.
    pub fn positions(&self) -> [&NodePattern; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    /// Returns a copy where every variable is replaced by [NodePattern::Any].
    #[must_use]
    pub fn without_variables(&self) -> Self {
        Self {
            subject: self.subject.without_variable(),
            predicate: self.predicate.without_variable(),
            object: self.object.without_variable(),
        }
    }

    /// Returns the variables of this pattern in position order (duplicates included).
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.positions().into_iter().filter_map(NodePattern::as_variable)
    }

    /// Returns whether the constant positions of this pattern match `triple`.
    ///
    /// A variable that occurs more than once is not checked for consistency here.
    pub fn matches(&self, triple: TripleRef<'_>) -> bool {
        self.subject.matches(triple.subject.into())
            && self.predicate.matches(triple.predicate.into())
            && self.object.matches(triple.object)
    }
}

impl From<&Triple> for TripleMatch {
    fn from(triple: &Triple) -> Self {
        Self::new(
            triple.subject.clone(),
            triple.predicate.clone(),
            triple.object.clone(),
        )
    }
}

impl Display for TripleMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::rdf;

    #[test]
    fn display_pattern() {
        let pattern = TripleMatch::new(
            Variable::new_unchecked("s"),
            rdf::TYPE.into_owned(),
            NodePattern::Any,
        );
        assert_eq!(
            pattern.to_string(),
            "(?s <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> ANY)"
        );
    }

    #[test]
    fn blank_nodes_become_variables() {
        let pattern = TriplePattern {
            subject: TermPattern::BlankNode(BlankNode::new_unchecked("b0")),
            predicate: NamedNodePattern::NamedNode(rdf::TYPE.into_owned()),
            object: TermPattern::Variable(Variable::new_unchecked("o")),
        };

        let as_variable = TripleMatch::from_pattern(&pattern, BlankNodeMatchingMode::Variable);
        assert_eq!(
            as_variable.subject,
            NodePattern::Variable(Variable::new_unchecked("_b0"))
        );

        let as_filter = TripleMatch::from_pattern(&pattern, BlankNodeMatchingMode::Filter);
        assert_eq!(
            as_filter.subject,
            NodePattern::Term(BlankNode::new_unchecked("b0").into())
        );
    }

    #[test]
    fn matches_ignores_variables() {
        let ex = NamedNode::new_unchecked("http://example.com/a");
        let triple = Triple::new(ex.clone(), ex.clone(), Literal::new_simple_literal("x"));
        let pattern = TripleMatch::new(
            ex.clone(),
            Variable::new_unchecked("p"),
            NodePattern::Any,
        );
        assert!(pattern.matches(triple.as_ref()));

        let other = TripleMatch::new(NodePattern::Any, NodePattern::Any, ex);
        assert!(!other.matches(triple.as_ref()));
    }
}
