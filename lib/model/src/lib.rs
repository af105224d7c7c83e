mod blank_node_mode;
mod pattern;

pub use blank_node_mode::BlankNodeMatchingMode;
pub use pattern::{NodePattern, TripleMatch};

// Re-export some oxrdf types.
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, Literal, LiteralRef, NamedNode, NamedNodeRef, Quad,
    Subject, SubjectRef, Term, TermParseError, TermRef, Triple, TripleRef, Variable, VariableRef,
};

// Re-export the spargebra types that are part of our API.
pub use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
