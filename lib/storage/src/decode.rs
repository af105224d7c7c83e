use graph_rdb_common::error::CorruptionError;
use graph_rdb_driver::SqlDriver;
use graph_rdb_model::{NamedNode, Subject, Term, Triple};

pub fn term_to_subject(term: Term) -> Result<Subject, CorruptionError> {
    match term {
        Term::NamedNode(nn) => Ok(nn.into()),
        Term::BlankNode(bnode) => Ok(bnode.into()),
        Term::Literal(lit) => Err(CorruptionError::msg(format!(
            "The literal {lit} cannot be used as a subject"
        ))),
    }
}

pub fn term_to_named_node(term: Term) -> Result<NamedNode, CorruptionError> {
    match term {
        Term::NamedNode(nn) => Ok(nn),
        other => Err(CorruptionError::msg(format!(
            "The term {other} cannot be used as a predicate"
        ))),
    }
}

pub fn decode_subject(driver: &dyn SqlDriver, encoded: &str) -> Result<Subject, CorruptionError> {
    term_to_subject(driver.rdb_string_to_node(encoded)?)
}

pub fn decode_optional(
    driver: &dyn SqlDriver,
    encoded: Option<&str>,
) -> Result<Option<Term>, CorruptionError> {
    encoded.map(|e| driver.rdb_string_to_node(e)).transpose()
}

/// Decodes a row of the statement table.
pub fn decode_triple(
    driver: &dyn SqlDriver,
    subject: &str,
    predicate: &str,
    object: &str,
) -> Result<Triple, CorruptionError> {
    Ok(Triple::new(
        decode_subject(driver, subject)?,
        term_to_named_node(driver.rdb_string_to_node(predicate)?)?,
        driver.rdb_string_to_node(object)?,
    ))
}
