use std::cmp::Ordering;

use datasmith_trees::{
    ConflictPriority, MultiTreeNode, ShapeConflictError, TraversalOptions, Tree, flatten,
    plain_leaf, reduce, selectors, translate,
};
use serde_json::{Value, json};

fn tree(value: Value) -> Tree {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn marked_leaf(_path: &[String], value: &Value) -> bool {
    !value.is_object() || value.get("_") == Some(&Value::Bool(true))
}

fn conflicting_trees() -> Vec<Tree> {
    vec![
        tree(json!({"a": {"b": {"_": false, "v": "foo"}, "c": 1}, "d": 4})),
        tree(json!({"a": {"b": {"_": false, "v": "bar"}, "c": 2}, "d": {"c": 5}})),
        tree(json!({"a": {"b": {"_": true, "v": "baz"}, "c": 3}, "d": 6})),
    ]
}

#[derive(Debug, PartialEq)]
enum TestError {
    Shape(ShapeConflictError),
    Rejected(String),
}

impl From<ShapeConflictError> for TestError {
    fn from(value: ShapeConflictError) -> Self {
        TestError::Shape(value)
    }
}

#[test]
fn reduce_visits_parents_before_children_in_first_seen_order() {
    let left = tree(json!({"a": {"b": 1}, "c": 2}));
    let right = tree(json!({"c": 3, "e": {"f": 4}}));
    let options = TraversalOptions::default();

    let visited = reduce(
        &[&left, &right],
        |mut acc: Vec<String>, node: &MultiTreeNode<'_>| -> Result<_, ShapeConflictError> {
            acc.push(node.path_string());
            Ok(acc)
        },
        Vec::new(),
        &options,
    )
    .expect("reduce");

    assert_eq!(visited, vec!["a", "a/b", "c", "e", "e/f"]);
}

#[test]
fn reduce_reports_leaf_classification_per_node() {
    let trees = conflicting_trees();
    let refs: Vec<&Tree> = trees.iter().collect();
    let options =
        TraversalOptions::new(marked_leaf).with_conflict_priority(ConflictPriority::NonLeaf);

    let leaves = reduce(
        &refs,
        |mut acc: Vec<(String, bool)>, node: &MultiTreeNode<'_>| -> Result<_, ShapeConflictError> {
            acc.push((node.path_string(), node.is_leaf));
            Ok(acc)
        },
        Vec::new(),
        &options,
    )
    .expect("reduce");

    assert_eq!(
        leaves,
        vec![
            ("a".to_string(), false),
            ("a/b".to_string(), false),
            ("a/b/_".to_string(), true),
            ("a/b/v".to_string(), true),
            ("a/c".to_string(), true),
            ("d".to_string(), false),
            ("d/c".to_string(), true),
        ]
    );
}

#[test]
fn translate_non_leaf_priority_recurses_through_conflicts() {
    let trees = conflicting_trees();
    let refs: Vec<&Tree> = trees.iter().collect();
    let options =
        TraversalOptions::new(marked_leaf).with_conflict_priority(ConflictPriority::NonLeaf);

    let merged: Tree =
        translate::<_, ShapeConflictError>(&refs, None, selectors::first, None, &options)
            .expect("translate");

    assert_eq!(
        Value::Object(merged),
        json!({"a": {"b": {"_": false, "v": "foo"}, "c": 1}, "d": {"c": 5}})
    );
}

#[test]
fn translate_leaf_priority_stops_at_the_shallower_structure() {
    let trees = conflicting_trees();
    let refs: Vec<&Tree> = trees.iter().collect();
    let options =
        TraversalOptions::new(marked_leaf).with_conflict_priority(ConflictPriority::Leaf);

    let merged: Tree =
        translate::<_, ShapeConflictError>(&refs, None, selectors::last, None, &options)
            .expect("translate");

    assert_eq!(
        Value::Object(merged),
        json!({"a": {"b": {"_": true, "v": "baz"}, "c": 3}, "d": 6})
    );
}

#[test]
fn translate_neither_priority_maps_congruent_trees() {
    let sizes = tree(json!({"a": {"b": 1, "c": 1}, "d": 2}));
    let names = tree(json!({
        "a": {"b": {"_": true, "name": "foo"}, "c": {"_": true, "name": "bar"}},
        "d": {"_": true, "name": "baz"}
    }));
    let options = TraversalOptions::new(|_: &[String], value: &Value| {
        !value.is_object() || value.get("_").is_some()
    })
    .with_conflict_priority(ConflictPriority::Neither);

    let html: Tree = translate::<_, ShapeConflictError>(
        &[&sizes, &names],
        None,
        |node: &MultiTreeNode<'_>| {
            let size = node.value(0).and_then(Value::as_i64).unwrap_or_default();
            let name = node
                .value(1)
                .and_then(|value| value.get("name"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            Ok(Value::String(format!("<h{size}>{name}</h{size}>")))
        },
        None,
        &options,
    )
    .expect("translate");

    assert_eq!(
        Value::Object(html),
        json!({"a": {"b": "<h1>foo</h1>", "c": "<h1>bar</h1>"}, "d": "<h2>baz</h2>"})
    );
}

#[test]
fn neither_priority_rejects_missing_keys() {
    let left = tree(json!({"a": {"b": 1}, "d": 2}));
    let right = tree(json!({"a": {"b": 1}}));
    let options = TraversalOptions::default().with_conflict_priority(ConflictPriority::Neither);

    let err = translate::<_, ShapeConflictError>(
        &[&left, &right],
        None,
        selectors::first,
        None,
        &options,
    )
    .expect_err("missing key must fail");

    assert_eq!(
        err,
        ShapeConflictError::Missing {
            path: "d".to_string(),
            missing: vec![1],
        }
    );
}

#[test]
fn neither_priority_rejects_leaf_branch_disagreement() {
    let left = tree(json!({"a": {"b": 1}}));
    let right = tree(json!({"a": {"b": {"x": 1}}}));
    let options = TraversalOptions::new(plain_leaf).with_conflict_priority(ConflictPriority::Neither);

    let err = reduce(
        &[&left, &right],
        |acc: usize, _node: &MultiTreeNode<'_>| -> Result<usize, ShapeConflictError> { Ok(acc + 1) },
        0,
        &options,
    )
    .expect_err("shape conflict must fail");

    assert_eq!(
        err,
        ShapeConflictError::Classification {
            path: "a/b".to_string(),
            leaf_trees: vec![0],
            branch_trees: vec![1],
        }
    );
    assert_eq!(err.path(), "a/b");
}

#[test]
fn filter_prunes_whole_subtrees_and_keeps_emptied_branches() {
    let source = tree(json!({"a": {"b": 1, "c": {"x": 1}}, "d": {"c": 2}, "e": 3}));
    let options = TraversalOptions::default();
    let mut drop_c = |node: &MultiTreeNode<'_>| -> Result<bool, ShapeConflictError> {
        Ok(node.key() != "c")
    };

    let filtered: Tree = translate::<_, ShapeConflictError>(
        &[&source],
        Some(&mut drop_c),
        selectors::first,
        None,
        &options,
    )
    .expect("translate");

    assert_eq!(
        Value::Object(filtered),
        json!({"a": {"b": 1}, "d": {}, "e": 3})
    );
}

#[test]
fn translate_inserts_into_the_seed() {
    let source = tree(json!({"a": 1}));
    let seed = tree(json!({"comp": {"in": "inc"}}));
    let options = TraversalOptions::default();

    let out: Tree = translate::<_, ShapeConflictError>(
        &[&source],
        None,
        selectors::first,
        Some(seed),
        &options,
    )
    .expect("translate");

    assert_eq!(Value::Object(out), json!({"comp": {"in": "inc"}, "a": 1}));
}

#[test]
fn callback_errors_propagate_unchanged() {
    let source = tree(json!({"a": 1, "b": 2}));
    let options = TraversalOptions::default();

    let err = translate(
        &[&source],
        None,
        |node: &MultiTreeNode<'_>| -> Result<Value, TestError> {
            if node.key() == "b" {
                Err(TestError::Rejected(node.path_string()))
            } else {
                Ok(Value::Null)
            }
        },
        None,
        &options,
    )
    .expect_err("mapper error");

    assert_eq!(err, TestError::Rejected("b".to_string()));
}

#[test]
fn flatten_composes_with_translate_into_a_path_map() {
    let trees = conflicting_trees();
    let refs: Vec<&Tree> = trees.iter().collect();
    let translate_options =
        TraversalOptions::new(marked_leaf).with_conflict_priority(ConflictPriority::Leaf);
    let merged: Tree = translate::<_, ShapeConflictError>(
        &refs,
        None,
        selectors::last,
        Some(tree(json!({"comp": {"in": "inc"}}))),
        &translate_options,
    )
    .expect("translate");

    let flat = flatten(
        &merged,
        tree(json!({"comp": {"out": "ex"}})),
        &TraversalOptions::new(marked_leaf),
    )
    .expect("flatten");

    assert_eq!(
        Value::Object(flat),
        json!({
            "comp": {"out": "ex"},
            "comp/in": "inc",
            "a/b": {"_": true, "v": "baz"},
            "a/c": 3,
            "d": 6
        })
    );
}

#[test]
fn flatten_orders_siblings_with_the_comparator() {
    let source = tree(json!({"b": {"y": 2, "x": 1}, "a": 3, "c": 4}));
    let options = TraversalOptions::default()
        .with_comparator(|a: &MultiTreeNode<'_>, b: &MultiTreeNode<'_>| a.key().cmp(b.key()));

    let values = flatten(&source, Vec::<Value>::new(), &options).expect("flatten");

    assert_eq!(values, vec![json!(3), json!(1), json!(2), json!(4)]);
}

#[test]
fn flatten_comparator_ties_keep_first_seen_order() {
    let source = tree(json!({"z": 1, "y": 2, "x": 3}));
    let options = TraversalOptions::default()
        .with_comparator(|_: &MultiTreeNode<'_>, _: &MultiTreeNode<'_>| Ordering::Equal);

    let values = flatten(&source, Vec::<Value>::new(), &options).expect("flatten");

    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn operations_leave_inputs_untouched() {
    let trees = conflicting_trees();
    let before = trees.clone();
    let refs: Vec<&Tree> = trees.iter().collect();
    let options =
        TraversalOptions::new(marked_leaf).with_conflict_priority(ConflictPriority::NonLeaf);

    let merged: Tree =
        translate::<_, ShapeConflictError>(&refs, None, selectors::first, None, &options)
            .expect("translate");
    let count = reduce(
        &refs,
        |acc: usize, _node: &MultiTreeNode<'_>| -> Result<usize, ShapeConflictError> { Ok(acc + 1) },
        0,
        &options,
    )
    .expect("reduce");
    let _ = flatten(&merged, Vec::<Value>::new(), &options).expect("flatten");

    assert!(count > 0);
    assert_eq!(trees, before);
    for (tree, original) in refs.iter().zip(trees.iter()) {
        assert!(std::ptr::eq(*tree, original));
    }
}
