use crate::binding::{Binding, VariableMap};
use crate::error::QueryError;
use graph_rdb_model::{NodePattern, Term, Variable};
use std::fmt::{Display, Formatter};

/// A variable that is not bound when the query starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeVar {
    variable: Variable,
    var_index: usize,
    listing: Option<usize>,
    is_arg: bool,
}

impl FreeVar {
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn var_index(&self) -> usize {
        self.var_index
    }

    /// The position of the variable in the result columns of the compiled query.
    pub fn listing(&self) -> Option<usize> {
        self.listing
    }

    /// Whether an earlier stage binds the variable, turning it into a query argument.
    pub fn is_arg(&self) -> bool {
        self.is_arg
    }
}

/// One classified position of a triple pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    /// A concrete node.
    Fixed(Term),
    /// A variable bound by the caller before planning, identified by its binding slot.
    Bound { variable: Variable, var_index: usize },
    /// A variable bound while the query runs.
    Free(FreeVar),
    /// Matches everything without binding anything.
    Any,
}

impl Element {
    /// Classifies `pattern`. Variables bound in `initial` become [Element::Bound].
    pub fn classify(pattern: &NodePattern, variables: &mut VariableMap, initial: &Binding) -> Self {
        match pattern {
            NodePattern::Any => Element::Any,
            NodePattern::Term(term) => Element::Fixed(term.clone()),
            NodePattern::Variable(variable) => {
                let var_index = variables.insert(variable);
                if initial.is_bound(var_index) {
                    Element::Bound {
                        variable: variable.clone(),
                        var_index,
                    }
                } else {
                    Element::Free(FreeVar {
                        variable: variable.clone(),
                        var_index,
                        listing: None,
                        is_arg: false,
                    })
                }
            }
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Element::Fixed(_))
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Element::Free(_))
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Element::Bound { .. })
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Element::Any)
    }

    /// Whether the element places no restriction on its position: a free result variable or a
    /// wildcard.
    pub fn is_unrestricted(&self) -> bool {
        match self {
            Element::Free(free) => !free.is_arg,
            Element::Any => true,
            Element::Fixed(_) | Element::Bound { .. } => false,
        }
    }

    pub fn as_constant(&self) -> Option<&Term> {
        match self {
            Element::Fixed(term) => Some(term),
            _ => None,
        }
    }

    pub fn as_free(&self) -> Option<&FreeVar> {
        match self {
            Element::Free(free) => Some(free),
            _ => None,
        }
    }

    pub fn variable(&self) -> Option<&Variable> {
        match self {
            Element::Bound { variable, .. } => Some(variable),
            Element::Free(free) => Some(&free.variable),
            Element::Fixed(_) | Element::Any => None,
        }
    }

    pub fn var_index(&self) -> Option<usize> {
        match self {
            Element::Bound { var_index, .. } => Some(*var_index),
            Element::Free(free) => Some(free.var_index),
            Element::Fixed(_) | Element::Any => None,
        }
    }

    /// The slot of a free variable that is not an argument.
    pub fn free_result_index(&self) -> Option<usize> {
        self.as_free().filter(|free| !free.is_arg).map(FreeVar::var_index)
    }

    /// Turns a free variable into an argument. Other elements are left untouched.
    pub fn mark_arg(&mut self) {
        if let Element::Free(free) = self {
            free.is_arg = true;
        }
    }

    /// Records the result column of a free variable. A listing is assigned at most once.
    pub fn set_listing(&mut self, listing: usize) -> Result<(), QueryError> {
        match self {
            Element::Free(free) => match free.listing {
                Some(existing) => QueryError::internal(format!(
                    "variable {} is already listed in result column {existing}",
                    free.variable
                )),
                None => {
                    free.listing = Some(listing);
                    Ok(())
                }
            },
            other => QueryError::internal(format!("{other} cannot be listed as a result")),
        }
    }

    /// The node pattern to use once the values of `binding` are substituted.
    pub fn substitute(&self, binding: &Binding) -> NodePattern {
        match self {
            Element::Fixed(term) => NodePattern::Term(term.clone()),
            Element::Any => NodePattern::Any,
            Element::Bound { variable, var_index }
            | Element::Free(FreeVar {
                variable,
                var_index,
                ..
            }) => binding
                .get(*var_index)
                .map_or_else(|| NodePattern::Variable(variable.clone()), |value| {
                    NodePattern::Term(value.clone())
                }),
        }
    }

    /// The element as an unbound node pattern, used to ask specialized graphs about it.
    pub fn to_node_pattern(&self) -> NodePattern {
        match self {
            Element::Fixed(term) => NodePattern::Term(term.clone()),
            Element::Any => NodePattern::Any,
            Element::Bound { variable, .. } => NodePattern::Variable(variable.clone()),
            Element::Free(free) => NodePattern::Variable(free.variable.clone()),
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Fixed(term) => write!(f, "{term}"),
            Element::Bound { variable, .. } => write!(f, "{variable}"),
            Element::Free(free) if free.is_arg => write!(f, "{}(arg)", free.variable),
            Element::Free(free) => write!(f, "{}", free.variable),
            Element::Any => f.write_str("ANY"),
        }
    }
}
