use graph_rdb_common::{match_value, MatchFunction};
use graph_rdb_model::{Term, Variable};
use std::fmt::{Display, Formatter};

/// A restriction on the value of a single variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// The IRI or lexical form of the value passes the string comparison.
    Match {
        variable: Variable,
        function: MatchFunction,
        pattern: String,
        case_sensitive: bool,
    },
    /// The value is exactly this term.
    Equals(Variable, Term),
}

impl Constraint {
    pub fn variable(&self) -> &Variable {
        match self {
            Constraint::Match { variable, .. } | Constraint::Equals(variable, _) => variable,
        }
    }

    /// Evaluates the constraint in memory. An unbound variable never satisfies it.
    pub fn evaluate(&self, value: Option<&Term>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            Constraint::Match {
                function,
                pattern,
                case_sensitive,
                ..
            } => match_value(value.as_ref())
                .is_some_and(|candidate| function.matches(candidate, pattern, *case_sensitive)),
            Constraint::Equals(_, expected) => value == expected,
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Match {
                variable,
                function,
                pattern,
                case_sensitive,
            } => {
                write!(f, "{function}({variable}, {pattern:?})")?;
                if !case_sensitive {
                    f.write_str(" ignoring case")?;
                }
                Ok(())
            }
            Constraint::Equals(variable, term) => write!(f, "{variable} = {term}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_rdb_model::{BlankNode, Literal};

    fn starts_with(pattern: &str, case_sensitive: bool) -> Constraint {
        Constraint::Match {
            variable: Variable::new_unchecked("x"),
            function: MatchFunction::StartsWith,
            pattern: pattern.to_owned(),
            case_sensitive,
        }
    }

    #[test]
    fn string_match_on_literals() {
        let paris: Term = Literal::new_simple_literal("Paris").into();

        assert!(starts_with("Par", true).evaluate(Some(&paris)));
        assert!(!starts_with("par", true).evaluate(Some(&paris)));
        assert!(starts_with("par", false).evaluate(Some(&paris)));
        assert!(!starts_with("Par", true).evaluate(None));
        assert!(!starts_with("", true).evaluate(Some(&BlankNode::default().into())));
    }

    #[test]
    fn equality() {
        let value: Term = Literal::new_simple_literal("a").into();
        let constraint = Constraint::Equals(Variable::new_unchecked("x"), value.clone());

        assert!(constraint.evaluate(Some(&value)));
        assert!(!constraint.evaluate(Some(&Literal::new_simple_literal("b").into())));
        assert_eq!(constraint.to_string(), "?x = \"a\"");
    }
}
