use graph_rdb_common::error::CorruptionError;
use graph_rdb_model::{BlankNode, Literal, NamedNode, Term, TermRef};

const URI_PREFIX: &str = "Uv::";
const BLANK_PREFIX: &str = "Bv::";
const LITERAL_PREFIX: &str = "Lv:";

/// Encodes a term as the string stored in a table column.
///
/// - Named nodes: `Uv::<iri>`
/// - Blank nodes: `Bv::<id>`
/// - Literals: `Lv:<language>:<datatype length>:<datatype><lexical form>`. The datatype is empty
///   for simple and language-tagged literals.
///
/// Two equal terms always have the same encoding, so the database can compare columns directly.
pub fn encode_node(term: TermRef<'_>) -> String {
    match term {
        TermRef::NamedNode(nn) => format!("{URI_PREFIX}{}", nn.as_str()),
        TermRef::BlankNode(bnode) => format!("{BLANK_PREFIX}{}", bnode.as_str()),
        TermRef::Literal(lit) => {
            let language = lit.language().unwrap_or("");
            let datatype = if lit.is_plain() {
                ""
            } else {
                lit.datatype().as_str()
            };
            format!(
                "{LITERAL_PREFIX}{language}:{}:{datatype}{}",
                datatype.len(),
                lit.value()
            )
        }
    }
}

/// The inverse of [encode_node].
pub fn decode_node(encoded: &str) -> Result<Term, CorruptionError> {
    if let Some(iri) = encoded.strip_prefix(URI_PREFIX) {
        return Ok(NamedNode::new_unchecked(iri).into());
    }
    if let Some(id) = encoded.strip_prefix(BLANK_PREFIX) {
        return Ok(BlankNode::new_unchecked(id).into());
    }
    if let Some(rest) = encoded.strip_prefix(LITERAL_PREFIX) {
        return decode_literal(rest)
            .map(Term::from)
            .ok_or_else(|| CorruptionError::msg(format!("Invalid literal encoding '{encoded}'")));
    }
    Err(CorruptionError::msg(format!(
        "Invalid node encoding '{encoded}'"
    )))
}

fn decode_literal(rest: &str) -> Option<Literal> {
    let (language, rest) = rest.split_once(':')?;
    let (datatype_len, rest) = rest.split_once(':')?;
    let datatype_len: usize = datatype_len.parse().ok()?;
    let datatype = rest.get(..datatype_len)?;
    let value = rest.get(datatype_len..)?;

    let literal = if !language.is_empty() {
        Literal::new_language_tagged_literal_unchecked(value, language)
    } else if datatype.is_empty() {
        Literal::new_simple_literal(value)
    } else {
        Literal::new_typed_literal(value, NamedNode::new_unchecked(datatype))
    };
    Some(literal)
}
