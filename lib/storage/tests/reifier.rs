use graph_rdb_common::error::{GraphError, StorageError};
use graph_rdb_common::{
    CompletionFlag, ReificationBehavior, SpecializedGraph, SubsumeResult, TableDescriptor,
    TableKind,
};
use graph_rdb_driver::{DriverKind, RdbConnection};
use graph_rdb_model::vocab::rdf;
use graph_rdb_model::{Literal, NamedNode, NodePattern, Subject, Term, Triple, TripleMatch, Variable};
use graph_rdb_storage::reification::ReificationRow;
use graph_rdb_storage::{ReificationTable, SpecializedGraphReifier};
use std::sync::Arc;

fn reifier(behavior: ReificationBehavior) -> SpecializedGraphReifier {
    let connection = Arc::new(RdbConnection::open_in_memory(DriverKind::Sqlite).unwrap());
    let table = TableDescriptor::new("rdb_reif", TableKind::Reifications, 1);
    connection.format_db(&[&table]).unwrap();
    SpecializedGraphReifier::new(ReificationTable::new(connection, table), behavior)
}

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn node(name: &str) -> Subject {
    ex(name).into()
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

fn add(reifier: &mut SpecializedGraphReifier, triple: &Triple) -> Result<(), GraphError> {
    let mut complete = CompletionFlag::default();
    reifier.add(triple, &mut complete)?;
    assert!(complete.is_done());
    Ok(())
}

fn delete(reifier: &mut SpecializedGraphReifier, triple: &Triple) {
    let mut complete = CompletionFlag::default();
    reifier.delete(triple, &mut complete).unwrap();
    assert!(complete.is_done());
}

fn rows(reifier: &SpecializedGraphReifier, node: &Subject) -> Vec<ReificationRow> {
    let fragments = reifier.fragments();
    fragments
        .connection()
        .with_connection(|conn| fragments.rows_for_node(conn, node))
        .unwrap()
}

#[test]
fn test_reify_as_and_lookup() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");

    assert_eq!(reifier.reify_as(&x, &statement()).unwrap(), x);

    assert_eq!(reifier.find_reified_triple(&x).unwrap(), Some(statement()));
    assert!(reifier.has_node(&x).unwrap());
    assert!(reifier.has_triple(&statement()).unwrap());
    assert!(!reifier.has_node(&node("y")).unwrap());
    assert_eq!(reifier.all_nodes().unwrap(), vec![x.clone()]);
    assert_eq!(reifier.triple_count().unwrap(), 4);
    assert_eq!(rows(&reifier, &x).len(), 1);
}

#[test]
fn test_reify_as_twice_is_idempotent() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");

    reifier.reify_as(&x, &statement()).unwrap();
    reifier.reify_as(&x, &statement()).unwrap();

    assert_eq!(reifier.triple_count().unwrap(), 4);
    assert_eq!(rows(&reifier, &x).len(), 1);
}

#[test]
fn test_adding_same_fragment_twice_keeps_row_count() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");
    let fragment = Triple::new(x.clone(), rdf::SUBJECT, ex("s"));

    add(&mut reifier, &fragment).unwrap();
    add(&mut reifier, &fragment).unwrap();

    assert_eq!(rows(&reifier, &x).len(), 1);
    assert_eq!(reifier.triple_count().unwrap(), 1);
}

#[test]
fn test_conflicting_fragment_on_complete_node_fails() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");
    reifier.reify_as(&x, &statement()).unwrap();

    let clash = Triple::new(x.clone(), rdf::OBJECT, Literal::new_simple_literal("other"));
    let result = add(&mut reifier, &clash);

    assert!(matches!(result, Err(GraphError::AlreadyReified { .. })));
    assert_eq!(reifier.find_reified_triple(&x).unwrap(), Some(statement()));
    assert_eq!(reifier.triple_count().unwrap(), 4);
    assert_eq!(rows(&reifier, &x).len(), 1);
}

#[test]
fn test_reify_as_with_different_statement_fails() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");
    reifier.reify_as(&x, &statement()).unwrap();

    let other = Triple::new(ex("s"), ex("p"), Literal::new_simple_literal("z"));
    let result = reifier.reify_as(&x, &other);

    assert!(matches!(result, Err(GraphError::AlreadyReified { .. })));
    assert_eq!(reifier.find_reified_triple(&x).unwrap(), Some(statement()));
}

#[test]
fn test_reify_as_over_conflicting_partial_fails() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");
    add(&mut reifier, &Triple::new(x.clone(), rdf::SUBJECT, ex("y"))).unwrap();

    let result = reifier.reify_as(&x, &statement());

    assert!(matches!(result, Err(GraphError::CannotReify { .. })));
    assert_eq!(reifier.triple_count().unwrap(), 1);
}

#[test]
fn test_reify_as_backfills_partial_reification() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");
    add(&mut reifier, &Triple::new(x.clone(), rdf::TYPE, rdf::STATEMENT)).unwrap();
    add(&mut reifier, &Triple::new(x.clone(), rdf::PREDICATE, ex("p"))).unwrap();

    reifier.reify_as(&x, &statement()).unwrap();

    assert_eq!(reifier.find_reified_triple(&x).unwrap(), Some(statement()));
    assert_eq!(rows(&reifier, &x).len(), 1);
}

#[test]
fn test_fragments_in_any_order_compact_to_one_row() {
    let x = node("x");
    let all = fragments(&x, &statement());
    for order in [[0, 1, 2, 3], [3, 2, 1, 0], [2, 3, 0, 1], [1, 3, 0, 2]] {
        let mut reifier = reifier(ReificationBehavior::HideNothing);
        for index in order {
            add(&mut reifier, &all[index]).unwrap();
        }

        assert_eq!(
            reifier.find_reified_triple(&x).unwrap(),
            Some(statement()),
            "order {order:?}"
        );
        assert_eq!(rows(&reifier, &x).len(), 1, "order {order:?}");
    }
}

#[test]
fn test_conflicting_partial_fragments_use_separate_rows() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");
    add(&mut reifier, &Triple::new(x.clone(), rdf::SUBJECT, ex("a"))).unwrap();
    add(&mut reifier, &Triple::new(x.clone(), rdf::SUBJECT, ex("b"))).unwrap();
    assert_eq!(rows(&reifier, &x).len(), 2);

    // The type row absorbs the first subject and stops at the conflicting one.
    add(&mut reifier, &Triple::new(x.clone(), rdf::TYPE, rdf::STATEMENT)).unwrap();
    assert_eq!(rows(&reifier, &x).len(), 2);

    delete(&mut reifier, &Triple::new(x.clone(), rdf::SUBJECT, ex("b")));
    add(&mut reifier, &Triple::new(x.clone(), rdf::PREDICATE, ex("p"))).unwrap();
    add(
        &mut reifier,
        &Triple::new(x.clone(), rdf::OBJECT, Literal::new_simple_literal("o")),
    )
    .unwrap();

    let expected = Triple::new(ex("a"), ex("p"), Literal::new_simple_literal("o"));
    assert_eq!(reifier.find_reified_triple(&x).unwrap(), Some(expected));
    assert_eq!(rows(&reifier, &x).len(), 1);
}

#[test]
fn test_deleting_all_fragments_leaves_nothing() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let x = node("x");
    reifier.reify_as(&x, &statement()).unwrap();

    for fragment in fragments(&x, &statement()) {
        delete(&mut reifier, &fragment);
    }

    assert!(rows(&reifier, &x).is_empty());
    assert_eq!(reifier.find_reified_triple(&x).unwrap(), None);
    assert_eq!(reifier.triple_count().unwrap(), 0);
}

#[test]
fn test_deleting_missing_fragment_is_a_no_op() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    delete(
        &mut reifier,
        &Triple::new(node("quint"), rdf::SUBJECT, ex("s")),
    );
    assert_eq!(reifier.triple_count().unwrap(), 0);
}

#[test]
fn test_remove_by_node() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let (x, y) = (node("x"), node("y"));
    let tx = Triple::new(ex("x"), ex("R"), ex("a"));
    let ty = Triple::new(ex("y"), ex("R"), ex("a"));
    reifier.reify_as(&x, &tx).unwrap();
    reifier.reify_as(&y, &ty).unwrap();

    reifier.remove(&x, &tx).unwrap();

    assert!(!reifier.has_node(&x).unwrap());
    assert_eq!(reifier.find_reified_triple(&y).unwrap(), Some(ty));
}

#[test]
fn test_remove_triple_removes_every_reification() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    reifier.reify_as(&node("x"), &statement()).unwrap();
    reifier.reify_as(&node("y"), &statement()).unwrap();
    assert_eq!(reifier.all_nodes_of(&statement()).unwrap().len(), 2);

    reifier.remove_triple(&statement()).unwrap();

    assert!(!reifier.has_triple(&statement()).unwrap());
    assert_eq!(reifier.triple_count().unwrap(), 0);
}

#[test]
fn test_non_reification_triples_are_not_handled() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    let mut complete = CompletionFlag::default();

    reifier
        .add(&Triple::new(ex("x"), rdf::TYPE, ex("Class")), &mut complete)
        .unwrap();

    assert!(!complete.is_done());
    assert_eq!(reifier.triple_count().unwrap(), 0);
}

#[test]
fn test_find_fragments() -> Result<(), StorageError> {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    reifier.reify_as(&node("x"), &statement()).unwrap();
    reifier.reify_as(&node("y"), &statement()).unwrap();

    let typed = TripleMatch::new(Variable::new_unchecked("s"), rdf::TYPE, rdf::STATEMENT);
    let mut complete = CompletionFlag::default();
    assert_eq!(reifier.find(&typed, &mut complete)?.len(), 2);
    assert!(complete.is_done());

    let by_node = TripleMatch::new(node("x"), NodePattern::Any, NodePattern::Any);
    assert_eq!(reifier.find_fragments(&by_node)?.len(), 4);

    let by_object = TripleMatch::new(
        NodePattern::Any,
        rdf::OBJECT,
        Term::from(Literal::new_simple_literal("o")),
    );
    assert_eq!(reifier.find_fragments(&by_object)?.len(), 2);

    let other_type = TripleMatch::new(NodePattern::Any, rdf::TYPE, ex("Class"));
    assert!(reifier.find_fragments(&other_type)?.is_empty());
    Ok(())
}

#[test]
fn test_subsumes() {
    let reifier = reifier(ReificationBehavior::HideNothing);
    let s = Variable::new_unchecked("s");

    let typed = TripleMatch::new(s.clone(), rdf::TYPE, rdf::STATEMENT);
    assert_eq!(
        reifier.subsumes(&typed, ReificationBehavior::HideNothing),
        SubsumeResult::AllTriples
    );
    assert_eq!(
        reifier.subsumes(&typed, ReificationBehavior::HideOnlyFull),
        SubsumeResult::SomeTriples
    );

    let any_type = TripleMatch::new(s.clone(), rdf::TYPE, Variable::new_unchecked("o"));
    assert_eq!(
        reifier.subsumes(&any_type, ReificationBehavior::HideNothing),
        SubsumeResult::SomeTriples
    );

    let subject = TripleMatch::new(s.clone(), rdf::SUBJECT, NodePattern::Any);
    assert_eq!(
        reifier.subsumes(&subject, ReificationBehavior::HideFullAndPartial),
        SubsumeResult::AllTriples
    );

    let other = TripleMatch::new(s.clone(), ex("p"), NodePattern::Any);
    assert_eq!(
        reifier.subsumes(&other, ReificationBehavior::HideNothing),
        SubsumeResult::NoTriples
    );

    let variable = TripleMatch::new(s, Variable::new_unchecked("p"), NodePattern::Any);
    assert_eq!(
        reifier.subsumes(&variable, ReificationBehavior::HideNothing),
        SubsumeResult::SomeTriples
    );
}

#[test]
fn test_clear() {
    let mut reifier = reifier(ReificationBehavior::HideNothing);
    reifier.reify_as(&node("x"), &statement()).unwrap();

    reifier.clear().unwrap();

    assert_eq!(reifier.triple_count().unwrap(), 0);
    assert!(reifier.all_nodes().unwrap().is_empty());
}
