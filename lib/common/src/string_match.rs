use graph_rdb_model::TermRef;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A string comparison that the query engine can evaluate in SQL or in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchFunction {
    StartsWith,
    Contains,
    EndsWith,
}

impl MatchFunction {
    pub fn name(self) -> &'static str {
        match self {
            MatchFunction::StartsWith => "starts_with",
            MatchFunction::Contains => "contains",
            MatchFunction::EndsWith => "ends_with",
        }
    }

    /// Evaluates the comparison. Both sides are lower-cased when `case_sensitive` is false.
    pub fn matches(self, value: &str, pattern: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.matches_exact(value, pattern)
        } else {
            self.matches_exact(&value.to_lowercase(), &pattern.to_lowercase())
        }
    }

    fn matches_exact(self, value: &str, pattern: &str) -> bool {
        match self {
            MatchFunction::StartsWith => value.starts_with(pattern),
            MatchFunction::Contains => value.contains(pattern),
            MatchFunction::EndsWith => value.ends_with(pattern),
        }
    }
}

impl Display for MatchFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatchFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starts_with" => Ok(MatchFunction::StartsWith),
            "contains" => Ok(MatchFunction::Contains),
            "ends_with" => Ok(MatchFunction::EndsWith),
            other => Err(format!("unknown match function '{other}'")),
        }
    }
}

/// The string a [MatchFunction] is applied to: the IRI of a named node or the lexical form of a
/// literal. Blank nodes never match.
pub fn match_value(term: TermRef<'_>) -> Option<&str> {
    match term {
        TermRef::NamedNode(nn) => Some(nn.as_str()),
        TermRef::Literal(lit) => Some(lit.value()),
        TermRef::BlankNode(_) => None,
    }
}
