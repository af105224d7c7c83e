//! Translation of a small SPARQL subset into graph queries.
//!
//! Only `SELECT` queries over a single basic graph pattern are supported. `FILTER` expressions
//! may combine, with `&&`, string matches (`STRSTARTS`, `CONTAINS`, `STRENDS`) on a variable
//! or on its `LCASE`/`UCASE`, and equality tests between a variable and a constant. Equality is
//! evaluated as `sameTerm`.

use crate::error::BasicQueryError;
use graph_rdb_common::MatchFunction;
use graph_rdb_model::{BlankNodeMatchingMode, Term, TripleMatch, Variable};
use graph_rdb_query::Constraint;
use spargebra::algebra::{Expression, Function, GraphPattern};
use spargebra::Query;

/// A `SELECT` query made of triple patterns and constraints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicQuery {
    projection: Vec<Variable>,
    patterns: Vec<TripleMatch>,
    constraints: Vec<Constraint>,
}

impl BasicQuery {
    /// Parses a SPARQL query.
    ///
    /// ```
    /// use graph_rdb::sparql::BasicQuery;
    ///
    /// let query = BasicQuery::parse(
    ///     "SELECT ?name WHERE { ?p <http://xmlns.com/foaf/0.1/name> ?name FILTER(STRSTARTS(?name, \"Jo\")) }",
    /// )?;
    /// assert_eq!(query.patterns().len(), 1);
    /// assert_eq!(query.constraints().len(), 1);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn parse(query: &str) -> Result<Self, BasicQueryError> {
        let Query::Select {
            dataset, pattern, ..
        } = Query::parse(query, None)?
        else {
            return Err(BasicQueryError::Unsupported(
                "only SELECT queries are supported".into(),
            ));
        };
        if dataset.is_some() {
            return Err(BasicQueryError::Unsupported(
                "FROM and FROM NAMED are not supported".into(),
            ));
        }

        let mut result = Self {
            projection: Vec::new(),
            patterns: Vec::new(),
            constraints: Vec::new(),
        };
        let projection = result.add_graph_pattern(&pattern)?;
        result.projection = match projection {
            Some(variables) => variables,
            None => {
                let mut variables = Vec::new();
                for variable in result.patterns.iter().flat_map(TripleMatch::variables) {
                    if !variables.contains(variable) {
                        variables.push(variable.clone());
                    }
                }
                variables
            }
        };
        Ok(result)
    }

    /// The variables returned by the query, in `SELECT` order.
    pub fn projection(&self) -> &[Variable] {
        &self.projection
    }

    pub fn patterns(&self) -> &[TripleMatch] {
        &self.patterns
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Collects the patterns and filters of `pattern`. Returns the projected variables if the
    /// pattern has a projection.
    fn add_graph_pattern(
        &mut self,
        pattern: &GraphPattern,
    ) -> Result<Option<Vec<Variable>>, BasicQueryError> {
        match pattern {
            GraphPattern::Project { inner, variables } => {
                self.add_graph_pattern(inner)?;
                Ok(Some(variables.clone()))
            }
            GraphPattern::Filter { expr, inner } => {
                let projection = self.add_graph_pattern(inner)?;
                self.add_filter(expr)?;
                Ok(projection)
            }
            GraphPattern::Bgp { patterns } => {
                self.patterns.extend(
                    patterns
                        .iter()
                        .map(|p| TripleMatch::from_pattern(p, BlankNodeMatchingMode::Variable)),
                );
                Ok(None)
            }
            other => Err(BasicQueryError::Unsupported(format!(
                "unsupported graph pattern: {other}"
            ))),
        }
    }

    fn add_filter(&mut self, expression: &Expression) -> Result<(), BasicQueryError> {
        match expression {
            Expression::And(left, right) => {
                self.add_filter(left)?;
                self.add_filter(right)
            }
            Expression::FunctionCall(function, args) => {
                let function = match function {
                    Function::StrStarts => MatchFunction::StartsWith,
                    Function::Contains => MatchFunction::Contains,
                    Function::StrEnds => MatchFunction::EndsWith,
                    _ => return Err(unsupported_filter(expression)),
                };
                let [target, Expression::Literal(pattern)] = args.as_slice() else {
                    return Err(unsupported_filter(expression));
                };
                let (variable, case_sensitive) = match target {
                    Expression::Variable(variable) => (variable, true),
                    Expression::FunctionCall(Function::LCase | Function::UCase, inner) => {
                        match inner.as_slice() {
                            [Expression::Variable(variable)] => (variable, false),
                            _ => return Err(unsupported_filter(expression)),
                        }
                    }
                    _ => return Err(unsupported_filter(expression)),
                };
                self.constraints.push(Constraint::Match {
                    variable: variable.clone(),
                    function,
                    pattern: pattern.value().to_owned(),
                    case_sensitive,
                });
                Ok(())
            }
            Expression::Equal(left, right) | Expression::SameTerm(left, right) => {
                let constraint = match (constant(left), constant(right)) {
                    (None, Some(value)) => match &**left {
                        Expression::Variable(variable) => {
                            Constraint::Equals(variable.clone(), value)
                        }
                        _ => return Err(unsupported_filter(expression)),
                    },
                    (Some(value), None) => match &**right {
                        Expression::Variable(variable) => {
                            Constraint::Equals(variable.clone(), value)
                        }
                        _ => return Err(unsupported_filter(expression)),
                    },
                    _ => return Err(unsupported_filter(expression)),
                };
                self.constraints.push(constraint);
                Ok(())
            }
            _ => Err(unsupported_filter(expression)),
        }
    }
}

fn constant(expression: &Expression) -> Option<Term> {
    match expression {
        Expression::NamedNode(node) => Some(node.clone().into()),
        Expression::Literal(literal) => Some(literal.clone().into()),
        _ => None,
    }
}

fn unsupported_filter(expression: &Expression) -> BasicQueryError {
    BasicQueryError::Unsupported(format!("unsupported filter: {expression}"))
}
