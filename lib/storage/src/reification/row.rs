use crate::decode::{term_to_named_node, term_to_subject};
use crate::reification::{ReificationComponent, ReificationStatementMask};
use graph_rdb_model::vocab::rdf;
use graph_rdb_model::{Subject, Term, Triple};

/// One row of the reification table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReificationRow {
    pub row_id: i64,
    pub node: Subject,
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
    pub has_type: bool,
}

impl ReificationRow {
    /// A new row holding a single fragment.
    pub fn fragment(node: &Subject, component: ReificationComponent, value: Term) -> Self {
        let mut row = Self::empty(node);
        row.set(component, Some(value));
        row
    }

    /// A new row holding all four components of `triple`.
    pub fn complete(node: &Subject, triple: &Triple) -> Self {
        Self {
            subject: Some(triple.subject.clone().into()),
            predicate: Some(triple.predicate.clone().into()),
            object: Some(triple.object.clone()),
            has_type: true,
            ..Self::empty(node)
        }
    }

    fn empty(node: &Subject) -> Self {
        Self {
            row_id: 0,
            node: node.clone(),
            subject: None,
            predicate: None,
            object: None,
            has_type: false,
        }
    }

    pub fn mask(&self) -> ReificationStatementMask {
        ReificationStatementMask::of_row(
            self.subject.is_some(),
            self.predicate.is_some(),
            self.object.is_some(),
            self.has_type,
        )
    }

    /// The object of the fragment triple stored for `component`, if any.
    pub fn value(&self, component: ReificationComponent) -> Option<Term> {
        match component {
            ReificationComponent::Subject => self.subject.clone(),
            ReificationComponent::Predicate => self.predicate.clone(),
            ReificationComponent::Object => self.object.clone(),
            ReificationComponent::Type => self.has_type.then(|| rdf::STATEMENT.into_owned().into()),
        }
    }

    /// Sets or clears `component`. The value of [ReificationComponent::Type] is ignored.
    pub fn set(&mut self, component: ReificationComponent, value: Option<Term>) {
        match component {
            ReificationComponent::Subject => self.subject = value,
            ReificationComponent::Predicate => self.predicate = value,
            ReificationComponent::Object => self.object = value,
            ReificationComponent::Type => self.has_type = value.is_some(),
        }
    }

    /// Copies every component of `other` into this row.
    pub fn absorb(&mut self, other: &ReificationRow) {
        for component in ReificationComponent::ALL {
            if let Some(value) = other.value(component) {
                self.set(component, Some(value));
            }
        }
    }

    /// Whether every component of this row is also present, with the same value, in `other`.
    pub fn is_covered_by(&self, other: &ReificationRow) -> bool {
        ReificationComponent::ALL.into_iter().all(|component| {
            self.value(component)
                .map_or(true, |value| other.value(component).as_ref() == Some(&value))
        })
    }

    /// The reified statement if the row is complete and its components form a valid triple.
    pub fn triple(&self) -> Option<Triple> {
        if !self.mask().is_complete() {
            return None;
        }
        let subject = term_to_subject(self.subject.clone()?).ok()?;
        let predicate = term_to_named_node(self.predicate.clone()?).ok()?;
        Some(Triple::new(subject, predicate, self.object.clone()?))
    }

    /// The fragment triples this row stands for.
    pub fn fragments(&self) -> impl Iterator<Item = Triple> + '_ {
        ReificationComponent::ALL.into_iter().filter_map(|component| {
            self.value(component)
                .map(|value| Triple::new(self.node.clone(), component.predicate(), value))
        })
    }
}
