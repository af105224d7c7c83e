use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How a graph treats triples that are part of a reified statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReificationBehavior {
    /// Optimize every reification triple, regardless of how it was added, and keep it visible.
    ///
    /// With this behavior, `add(t)` followed by `contains(t)` is always true.
    #[default]
    HideNothing,
    /// Optimize all reification triples but hide them from `find`, `contains` and `len`. They are
    /// only visible through the reifier.
    HideFullAndPartial,
    /// Only statements reified through the reifier are optimized and hidden. Reification triples
    /// added with `add` are stored as ordinary statements.
    HideOnlyFull,
}

impl ReificationBehavior {
    /// The integer code used in persisted graph properties.
    pub fn code(self) -> i32 {
        match self {
            ReificationBehavior::HideNothing => 1,
            ReificationBehavior::HideFullAndPartial => 2,
            ReificationBehavior::HideOnlyFull => 3,
        }
    }

    /// The inverse of [Self::code].
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ReificationBehavior::HideNothing),
            2 => Some(ReificationBehavior::HideFullAndPartial),
            3 => Some(ReificationBehavior::HideOnlyFull),
            _ => None,
        }
    }

    /// Whether the reifier takes part in `find`, `contains`, and `len`.
    pub fn reifier_visible(self) -> bool {
        self == ReificationBehavior::HideNothing
    }

    /// Whether triples added through the graph may be routed to the reifier.
    pub fn reifier_accepts_graph_writes(self) -> bool {
        self != ReificationBehavior::HideOnlyFull
    }
}

impl Display for ReificationBehavior {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReificationBehavior::HideNothing => "hide-nothing",
            ReificationBehavior::HideFullAndPartial => "hide-full-and-partial",
            ReificationBehavior::HideOnlyFull => "hide-only-full",
        })
    }
}

impl FromStr for ReificationBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hide-nothing" => Ok(ReificationBehavior::HideNothing),
            "hide-full-and-partial" => Ok(ReificationBehavior::HideFullAndPartial),
            "hide-only-full" => Ok(ReificationBehavior::HideOnlyFull),
            other => Err(format!("unknown reification behavior '{other}'")),
        }
    }
}
