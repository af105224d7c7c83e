use graph_rdb_common::ColumnName;
use graph_rdb_model::vocab::rdf;
use graph_rdb_model::{NamedNodeRef, TermRef};
use std::fmt::{Display, Formatter};
use std::ops::{BitOr, BitOrAssign};

/// One of the four triples making up a reification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReificationComponent {
    Subject,
    Predicate,
    Object,
    Type,
}

impl ReificationComponent {
    pub const ALL: [ReificationComponent; 4] = [
        ReificationComponent::Subject,
        ReificationComponent::Predicate,
        ReificationComponent::Object,
        ReificationComponent::Type,
    ];

    /// The component stored under `predicate`, regardless of the object.
    pub fn of_predicate(predicate: NamedNodeRef<'_>) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|component| component.predicate() == predicate)
    }

    /// Classifies a triple `(node, predicate, object)`. Returns [None] if the triple is not a
    /// reification fragment.
    ///
    /// `rdf:type` only counts if the object is `rdf:Statement`.
    pub fn of_fragment(predicate: NamedNodeRef<'_>, object: TermRef<'_>) -> Option<Self> {
        match Self::of_predicate(predicate)? {
            ReificationComponent::Type if object != TermRef::from(rdf::STATEMENT) => None,
            component => Some(component),
        }
    }

    /// The predicate of the fragment triple.
    pub fn predicate(self) -> NamedNodeRef<'static> {
        match self {
            ReificationComponent::Subject => rdf::SUBJECT,
            ReificationComponent::Predicate => rdf::PREDICATE,
            ReificationComponent::Object => rdf::OBJECT,
            ReificationComponent::Type => rdf::TYPE,
        }
    }

    /// The column of the reification table holding this component.
    pub fn column(self) -> ColumnName {
        match self {
            ReificationComponent::Subject => ColumnName::Subj,
            ReificationComponent::Predicate => ColumnName::Prop,
            ReificationComponent::Object => ColumnName::Obj,
            ReificationComponent::Type => ColumnName::HasType,
        }
    }

    pub fn mask(self) -> ReificationStatementMask {
        match self {
            ReificationComponent::Subject => ReificationStatementMask::HAS_SUBJECT,
            ReificationComponent::Predicate => ReificationStatementMask::HAS_PREDICATE,
            ReificationComponent::Object => ReificationStatementMask::HAS_OBJECT,
            ReificationComponent::Type => ReificationStatementMask::HAS_TYPE,
        }
    }
}

/// The set of components present in one or more reification rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReificationStatementMask(u8);

impl ReificationStatementMask {
    pub const EMPTY: Self = Self(0);
    pub const HAS_SUBJECT: Self = Self(1);
    pub const HAS_PREDICATE: Self = Self(2);
    pub const HAS_OBJECT: Self = Self(4);
    pub const HAS_TYPE: Self = Self(8);
    pub const IS_COMPLETE: Self = Self(16);

    const COMPONENTS: u8 = 1 | 2 | 4 | 8;

    /// The mask of a single row. The row is complete if it holds all four components.
    pub fn of_row(subject: bool, predicate: bool, object: bool, has_type: bool) -> Self {
        let mut mask = Self::EMPTY;
        for (present, bit) in [
            (subject, Self::HAS_SUBJECT),
            (predicate, Self::HAS_PREDICATE),
            (object, Self::HAS_OBJECT),
            (has_type, Self::HAS_TYPE),
        ] {
            if present {
                mask |= bit;
            }
        }
        mask.merge(Self::EMPTY)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether both masks share any bit.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, component: ReificationComponent) -> bool {
        self.intersects(component.mask())
    }

    /// Whether a row with this mask holds a whole statement.
    pub fn is_complete(self) -> bool {
        self.intersects(Self::IS_COMPLETE)
    }

    /// The number of components, ignoring the completeness bit.
    pub fn component_count(self) -> u32 {
        (self.0 & Self::COMPONENTS).count_ones()
    }

    /// The union of both masks. The result is complete if all four components are present.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let merged = (self.0 | other.0) & Self::COMPONENTS;
        if merged == Self::COMPONENTS {
            Self(merged | Self::IS_COMPLETE.0)
        } else {
            Self(merged)
        }
    }

    #[must_use]
    pub fn without(self, component: ReificationComponent) -> Self {
        Self(self.0 & !component.mask().0 & Self::COMPONENTS)
    }
}

impl BitOr for ReificationStatementMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ReificationStatementMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Display for ReificationStatementMask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (bit, c) in [
            (Self::HAS_SUBJECT, 'S'),
            (Self::HAS_PREDICATE, 'P'),
            (Self::HAS_OBJECT, 'O'),
            (Self::HAS_TYPE, 'T'),
            (Self::IS_COMPLETE, '*'),
        ] {
            if self.intersects(bit) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_rdb_model::NamedNode;

    #[test]
    fn row_with_all_components_is_complete() {
        let mask = ReificationStatementMask::of_row(true, true, true, true);
        assert!(mask.is_complete());
        assert_eq!(mask.to_string(), "SPOT*");

        let partial = ReificationStatementMask::of_row(true, false, true, false);
        assert!(!partial.is_complete());
        assert_eq!(partial.component_count(), 2);
    }

    #[test]
    fn removing_a_component_drops_completeness() {
        let complete = ReificationStatementMask::of_row(true, true, true, true);
        let mask = complete.without(ReificationComponent::Subject);
        assert!(!mask.is_complete());
        assert!(!mask.contains(ReificationComponent::Subject));
        assert_eq!(mask.component_count(), 3);
    }

    #[test]
    fn merge_becomes_complete() {
        let left = ReificationStatementMask::of_row(true, true, false, false);
        let right = ReificationStatementMask::of_row(false, false, true, true);
        assert!(!left.intersects(right));
        assert!(left.merge(right).is_complete());
    }

    #[test]
    fn type_fragment_requires_statement_object() {
        let other = NamedNode::new_unchecked("http://example.com/Class");
        assert_eq!(
            ReificationComponent::of_fragment(rdf::TYPE, rdf::STATEMENT.into()),
            Some(ReificationComponent::Type)
        );
        assert_eq!(
            ReificationComponent::of_fragment(rdf::TYPE, other.as_ref().into()),
            None
        );
        assert_eq!(
            ReificationComponent::of_fragment(rdf::OBJECT, other.as_ref().into()),
            Some(ReificationComponent::Object)
        );
    }
}
