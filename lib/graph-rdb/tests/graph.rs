#![cfg(test)]

use graph_rdb::common::error::GraphError;
use graph_rdb::common::{MatchFunction, ReificationBehavior};
use graph_rdb::config::GraphConfig;
use graph_rdb::driver::{DriverKind, RdbConnection};
use graph_rdb::error::LoaderError;
use graph_rdb::graph::GraphRdb;
use graph_rdb::model::vocab::rdf;
use graph_rdb::model::{
    Literal, NamedNode, NodePattern, Subject, Term, Triple, TripleMatch, Variable,
};
use graph_rdb::query::{Constraint, QueryError, QueryOptions, QuerySolution};
use graph_rdb::sparql::BasicQuery;
use oxrdfio::RdfFormat;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

const DATA: &str = r#"
@prefix foaf: <http://xmlns.com/foaf/0.1/> .
@prefix ex: <http://example.com/> .

ex:alice a foaf:Person ;
    foaf:name "Alice" ;
    foaf:knows ex:bob , ex:carol .
ex:bob a foaf:Person ;
    foaf:name "Bob" ;
    foaf:knows ex:carol .
ex:carol a foaf:Person ;
    foaf:name "Carol"@en .
"#;
const NUMBER_OF_TRIPLES: usize = 9;

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn foaf(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://xmlns.com/foaf/0.1/{name}"))
}

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

fn statement() -> Triple {
    Triple::new(ex("s"), ex("p"), Literal::new_simple_literal("o"))
}

fn fragments(node: &Subject, triple: &Triple) -> Vec<Triple> {
    vec![
        Triple::new(node.clone(), rdf::SUBJECT, triple.subject.clone()),
        Triple::new(node.clone(), rdf::PREDICATE, triple.predicate.clone()),
        Triple::new(node.clone(), rdf::OBJECT, triple.object.clone()),
        Triple::new(node.clone(), rdf::TYPE, rdf::STATEMENT),
    ]
}

fn graph(behavior: ReificationBehavior) -> GraphRdb {
    GraphRdb::open_in_memory(GraphConfig::new().with_reification_behavior(behavior)).unwrap()
}

fn loaded_graph() -> Result<GraphRdb, Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideNothing);
    graph.load_from_reader(RdfFormat::Turtle, DATA.as_bytes())?;
    Ok(graph)
}

fn rows(
    solutions: impl Iterator<Item = Result<QuerySolution, QueryError>>,
    variables: &[&str],
) -> Result<Vec<Vec<String>>, QueryError> {
    let mut rows = solutions
        .map(|solution| {
            let solution = solution?;
            Ok(variables
                .iter()
                .map(|name| solution.get(name).map_or_else(String::new, Term::to_string))
                .collect())
        })
        .collect::<Result<Vec<Vec<String>>, QueryError>>()?;
    rows.sort();
    Ok(rows)
}

#[test]
fn test_add_contains_delete() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideNothing);
    assert!(graph.is_empty()?);

    graph.add(&statement())?;
    assert!(graph.contains(&statement())?);
    assert_eq!(graph.len()?, 1);

    graph.delete(&statement())?;
    assert!(!graph.contains(&statement())?);
    assert!(graph.is_empty()?);

    graph.delete(&statement())?;
    Ok(())
}

#[test]
fn test_load_turtle() -> Result<(), Box<dyn Error>> {
    let graph = loaded_graph()?;

    assert_eq!(graph.len()?, NUMBER_OF_TRIPLES);
    assert!(graph.contains(&Triple::new(ex("bob"), foaf("knows"), ex("carol")))?);
    assert_eq!(
        graph
            .find(&TripleMatch::new(NodePattern::Any, foaf("name"), NodePattern::Any))?
            .len(),
        3
    );
    Ok(())
}

#[test]
fn test_load_renames_blank_nodes() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideNothing);
    let data = "_:b <http://example.com/p> \"v\" .\n";

    graph.load_from_reader(RdfFormat::NTriples, data.as_bytes())?;
    graph.load_from_reader(RdfFormat::NTriples, data.as_bytes())?;

    assert_eq!(graph.len()?, 2);
    Ok(())
}

#[test]
fn test_load_rejects_named_graphs() {
    let mut graph = graph(ReificationBehavior::HideNothing);
    let data = "<http://example.com/s> <http://example.com/p> <http://example.com/o> <http://example.com/g> .\n";

    let result = graph.load_from_reader(RdfFormat::NQuads, data.as_bytes());

    assert!(matches!(result, Err(LoaderError::NamedGraph(_))));
}

#[test]
fn test_load_reports_syntax_errors() {
    let mut graph = graph(ReificationBehavior::HideNothing);

    let result = graph.load_from_reader(RdfFormat::Turtle, "<http://example.com/s> .".as_bytes());

    assert!(matches!(result, Err(LoaderError::Parsing(_))));
}

#[test]
fn test_reification_triples_stay_visible_by_default() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideNothing);
    let node = Subject::from(ex("n"));

    graph.add_all(fragments(&node, &statement()))?;

    assert_eq!(graph.len()?, 4);
    assert_eq!(graph.reifier_len()?, 4);
    for fragment in fragments(&node, &statement()) {
        assert!(graph.contains(&fragment)?);
    }
    assert_eq!(
        graph.reifier()?.find_reified_triple(&node)?,
        Some(statement())
    );
    Ok(())
}

#[test]
fn test_hide_full_and_partial_hides_fragments() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideFullAndPartial);
    let node = Subject::from(ex("n"));

    graph.add(&statement())?;
    graph.add_all(fragments(&node, &statement()))?;

    assert_eq!(graph.len()?, 1);
    assert_eq!(graph.reifier_len()?, 4);
    assert!(!graph.contains(&Triple::new(node.clone(), rdf::TYPE, rdf::STATEMENT))?);
    assert!(graph.reifier()?.has_node(&node)?);
    Ok(())
}

#[test]
fn test_hide_only_full_keeps_added_fragments_as_statements() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideOnlyFull);
    let added = Subject::from(ex("added"));
    let reified = Subject::from(ex("reified"));

    graph.add_all(fragments(&added, &statement()))?;
    graph.reifier()?.reify_as(ex("reified"), &statement())?;

    assert_eq!(graph.len()?, 4);
    assert_eq!(graph.reifier_len()?, 4);
    assert!(graph.contains(&Triple::new(added, rdf::TYPE, rdf::STATEMENT))?);
    assert!(!graph.contains(&Triple::new(reified.clone(), rdf::TYPE, rdf::STATEMENT))?);
    assert_eq!(graph.reifier()?.all_nodes()?, vec![reified]);
    Ok(())
}

#[test]
fn test_reifier_operations() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideNothing);
    let other = Triple::new(ex("s"), ex("p"), ex("other"));

    let node = graph.reifier()?.reify(&statement())?;
    assert!(matches!(node, Subject::BlankNode(_)));
    assert!(graph.reifier()?.has_triple(&statement())?);
    assert!(matches!(
        graph.reifier()?.reify_as(node.clone(), &other),
        Err(GraphError::AlreadyReified { .. })
    ));

    let named = graph.reifier()?.reify_as(ex("n"), &statement())?;
    assert_eq!(graph.reifier()?.all_nodes_of(&statement())?.len(), 2);

    graph.reifier()?.remove(&named, &statement())?;
    assert!(!graph.reifier()?.has_node(&named)?);
    graph.reifier()?.remove_triple(&statement())?;
    assert!(graph.reifier()?.is_empty()?);
    assert!(graph.is_empty()?);
    Ok(())
}

#[test]
fn test_clear_removes_hidden_triples() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideFullAndPartial);
    graph.add(&statement())?;
    graph.reifier()?.reify(&statement())?;

    graph.clear()?;

    assert!(graph.is_empty()?);
    assert_eq!(graph.reifier_len()?, 0);
    Ok(())
}

#[test]
fn test_graphs_sharing_a_connection_are_isolated() -> Result<(), Box<dyn Error>> {
    let connection = Arc::new(RdbConnection::open_in_memory(DriverKind::Sqlite)?);
    let mut first = GraphRdb::with_connection(Arc::clone(&connection), GraphConfig::new())?;
    let second = GraphRdb::with_connection(connection, GraphConfig::new().with_graph_id(2))?;

    first.add(&statement())?;

    assert_eq!(first.len()?, 1);
    assert!(second.is_empty()?);
    Ok(())
}

#[test]
fn test_invalid_table_prefix_is_rejected() {
    let result = GraphRdb::open_in_memory(GraphConfig::new().with_table_prefix("x; DROP TABLE y"));

    assert!(matches!(result, Err(GraphError::InvalidConfig(_))));
}

#[test]
fn test_closed_graph_rejects_calls() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideNothing);
    graph.add(&statement())?;

    graph.close();

    assert!(graph.is_closed());
    assert!(matches!(graph.add(&statement()), Err(GraphError::Closed)));
    assert!(matches!(graph.len(), Err(GraphError::Closed)));
    assert!(matches!(graph.reifier(), Err(GraphError::Closed)));
    assert!(matches!(
        graph.query(&[TripleMatch::any()], &[]),
        Err(QueryError::Closed)
    ));
    Ok(())
}

#[test]
fn test_query_joins_patterns() -> Result<(), Box<dyn Error>> {
    let graph = loaded_graph()?;
    let patterns = [
        TripleMatch::new(var("x"), foaf("knows"), var("y")),
        TripleMatch::new(var("y"), foaf("name"), var("n")),
    ];

    let solutions = graph.query(&patterns, &[])?;

    assert_eq!(
        rows(solutions, &["x", "n"])?,
        vec![
            vec!["<http://example.com/alice>".to_owned(), "\"Bob\"".to_owned()],
            vec!["<http://example.com/alice>".to_owned(), "\"Carol\"@en".to_owned()],
            vec!["<http://example.com/bob>".to_owned(), "\"Carol\"@en".to_owned()],
        ]
    );
    Ok(())
}

#[test]
fn test_query_with_bindings() -> Result<(), Box<dyn Error>> {
    let graph = loaded_graph()?;
    let patterns = [TripleMatch::new(var("x"), foaf("knows"), var("y"))];

    let solutions =
        graph.query_with_bindings(&patterns, &[], &[(var("x"), ex("bob").into())])?;

    assert_eq!(
        rows(solutions, &["x", "y"])?,
        vec![vec![
            "<http://example.com/bob>".to_owned(),
            "<http://example.com/carol>".to_owned()
        ]]
    );
    Ok(())
}

#[test]
fn test_query_with_constraints() -> Result<(), Box<dyn Error>> {
    let graph = loaded_graph()?;
    let patterns = [
        TripleMatch::new(var("p"), rdf::TYPE, foaf("Person")),
        TripleMatch::new(var("p"), foaf("name"), var("n")),
    ];
    let constraints = [Constraint::Match {
        variable: var("n"),
        function: MatchFunction::EndsWith,
        pattern: "OL".into(),
        case_sensitive: false,
    }];

    let solutions = graph.query(&patterns, &constraints)?;

    assert_eq!(
        rows(solutions, &["p"])?,
        vec![vec!["<http://example.com/carol>".to_owned()]]
    );
    Ok(())
}

#[test]
fn test_query_reifications() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideNothing);
    graph.add(&statement())?;
    graph.reifier()?.reify_as(ex("n"), &statement())?;
    let patterns = [
        TripleMatch::new(var("r"), rdf::SUBJECT, var("s")),
        TripleMatch::new(var("r"), rdf::OBJECT, var("o")),
        TripleMatch::new(var("s"), ex("p"), var("o")),
    ];

    let solutions = graph.query(&patterns, &[])?;

    assert_eq!(
        rows(solutions, &["r", "s"])?,
        vec![vec![
            "<http://example.com/n>".to_owned(),
            "<http://example.com/s>".to_owned()
        ]]
    );
    Ok(())
}

#[test]
fn test_query_hides_reifications() -> Result<(), Box<dyn Error>> {
    let mut graph = graph(ReificationBehavior::HideFullAndPartial);
    graph.reifier()?.reify_as(ex("n"), &statement())?;

    let solutions = graph.query(&[TripleMatch::new(var("r"), rdf::SUBJECT, var("s"))], &[])?;

    assert!(rows(solutions, &["r"])?.is_empty());
    Ok(())
}

#[test]
fn test_basic_sparql_query() -> Result<(), Box<dyn Error>> {
    let graph = loaded_graph()?;
    let query = BasicQuery::parse(
        "PREFIX foaf: <http://xmlns.com/foaf/0.1/>
         SELECT ?name WHERE {
             ?p foaf:knows <http://example.com/carol> ; foaf:name ?name
             FILTER(STRSTARTS(?name, \"A\"))
         }",
    )?;

    let solutions = graph.query_basic(&query)?;

    let names = rows(solutions, &["name"])?;
    assert_eq!(names, vec![vec!["\"Alice\"".to_owned()]]);
    Ok(())
}

#[test]
fn test_explain() -> Result<(), Box<dyn Error>> {
    let graph = loaded_graph()?;
    let patterns = [
        TripleMatch::new(var("x"), foaf("knows"), var("y")),
        TripleMatch::new(var("y"), foaf("name"), var("n")),
    ];

    let explanation = graph.explain(&patterns, &[])?;

    insta::assert_snapshot!(explanation, @"sql: SELECT A0.Subj, A0.Obj, A1.Obj FROM rdb_stmt A0, rdb_stmt A1 WHERE A0.GraphId = 1 AND A0.Prop = 'Uv::http://xmlns.com/foaf/0.1/knows' AND A1.GraphId = 1 AND A1.Subj = A0.Obj AND A1.Prop = 'Uv::http://xmlns.com/foaf/0.1/name'");
    Ok(())
}

#[test]
fn test_query_without_planner_shortcuts() -> Result<(), Box<dyn Error>> {
    let options = QueryOptions::new()
        .with_fast_path(false)
        .with_implicit_join(false);
    let mut plain = GraphRdb::open_in_memory(GraphConfig::new().with_query_options(options))?;
    plain.load_from_reader(RdfFormat::Turtle, DATA.as_bytes())?;
    let graph = loaded_graph()?;
    let patterns = [TripleMatch::new(var("x"), foaf("name"), var("n"))];

    let expected = rows(graph.query(&patterns, &[])?, &["x", "n"])?;
    let actual = rows(plain.query(&patterns, &[])?, &["x", "n"])?;

    assert!(!expected.is_empty());
    assert_eq!(actual, expected);
    Ok(())
}

#[test]
fn test_persistence() -> Result<(), Box<dyn Error>> {
    let dir = std::env::temp_dir().join(format!("graph-rdb-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("graph.db");
    {
        let mut graph = GraphRdb::open(&path, GraphConfig::new())?;
        graph.add(&statement())?;
    }

    let graph = GraphRdb::open(&path, GraphConfig::new())?;
    assert!(graph.contains(&statement())?);
    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
