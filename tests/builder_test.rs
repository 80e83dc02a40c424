//! Tests for building the tree model from flat and nested snapshots

use serde_json::json;

use rfpweights::domain::{
    DomainError, NestedNode, NodeId, NodeKind, TreeBuilder, TreeSnapshot,
};

fn nested(value: serde_json::Value) -> TreeSnapshot {
    let roots: Vec<NestedNode> = serde_json::from_value(value).expect("valid nested snapshot");
    TreeSnapshot::from_nested(&roots)
}

fn flat(value: serde_json::Value) -> TreeSnapshot {
    serde_json::from_value(value).expect("valid flat snapshot")
}

fn ids(tree: &rfpweights::domain::TreeArena) -> Vec<String> {
    tree.iter()
        .map(|(_, n)| n.data.id.as_str().to_string())
        .collect()
}

#[test]
fn given_nested_snapshot_when_building_then_preserves_preorder() {
    let snapshot = nested(json!([
        {"id": "d1", "type": "category", "code": "1", "title": "Functional", "level": 1, "children": [
            {"id": "c1", "type": "category", "code": "1.1", "level": 2, "children": [
                {"id": "r1", "type": "requirement", "code": "1.1.1", "level": 3},
                {"id": "r2", "type": "requirement", "code": "1.1.2", "level": 3}
            ]},
            {"id": "r3", "type": "requirement", "code": "1.2", "level": 2}
        ]},
        {"id": "d2", "type": "category", "code": "2", "level": 1}
    ]));

    let tree = TreeBuilder::new().build(&snapshot).unwrap();

    assert_eq!(tree.len(), 6);
    assert_eq!(tree.roots().len(), 2);
    assert_eq!(ids(&tree), vec!["d1", "c1", "r1", "r2", "r3", "d2"]);
    assert_eq!(tree.depth(), 3);
}

#[test]
fn given_flat_snapshot_when_building_then_roots_are_unreferenced_nodes() {
    let snapshot = flat(json!({"nodes": [
        {"id": "r1", "kind": "requirement"},
        {"id": "a", "kind": "category", "children": ["r1", "r2"]},
        {"id": "r2", "kind": "requirement"},
        {"id": "b", "kind": "category"}
    ]}));

    let tree = TreeBuilder::new().build(&snapshot).unwrap();

    let roots: Vec<&str> = tree
        .roots()
        .iter()
        .map(|&idx| tree.get_node(idx).unwrap().data.id.as_str())
        .collect();
    assert_eq!(roots, vec!["a", "b"]);
    let a = tree.node(&"a".into()).unwrap();
    assert_eq!(a.children.len(), 2);
}

#[test]
fn given_empty_category_when_building_then_it_is_a_leaf() {
    let snapshot = nested(json!([
        {"id": "a", "type": "category", "children": [{"id": "r1", "type": "requirement"}]},
        {"id": "empty", "type": "category"}
    ]));

    let tree = TreeBuilder::new().build(&snapshot).unwrap();

    let leaves = tree.leaf_nodes();
    assert_eq!(leaves, vec![NodeId::from("r1"), NodeId::from("empty")]);
    assert_eq!(
        tree.node(&"empty".into()).unwrap().data.kind,
        NodeKind::Category
    );
}

#[test]
fn given_duplicate_ids_when_building_then_errors() {
    let snapshot = flat(json!({"nodes": [
        {"id": "a", "kind": "category"},
        {"id": "a", "kind": "requirement"}
    ]}));

    let result = TreeBuilder::new().build(&snapshot);

    assert_eq!(result.unwrap_err(), DomainError::DuplicateNode("a".into()));
}

#[test]
fn given_requirement_with_children_when_building_then_errors() {
    let snapshot = flat(json!({"nodes": [
        {"id": "r", "kind": "requirement", "children": ["x"]},
        {"id": "x", "kind": "requirement"}
    ]}));

    let result = TreeBuilder::new().build(&snapshot);

    assert_eq!(
        result.unwrap_err(),
        DomainError::RequirementWithChildren("r".into())
    );
}

#[test]
fn given_dangling_child_when_building_then_errors() {
    let snapshot = flat(json!({"nodes": [
        {"id": "a", "kind": "category", "children": ["missing"]}
    ]}));

    let result = TreeBuilder::new().build(&snapshot);

    assert!(matches!(result, Err(DomainError::UnknownChild { .. })));
}

#[test]
fn given_shared_child_when_building_then_errors() {
    let snapshot = flat(json!({"nodes": [
        {"id": "a", "kind": "category", "children": ["r"]},
        {"id": "b", "kind": "category", "children": ["r"]},
        {"id": "r", "kind": "requirement"}
    ]}));

    let result = TreeBuilder::new().build(&snapshot);

    assert!(matches!(result, Err(DomainError::MultipleParents { .. })));
}

#[test]
fn given_cycle_when_building_then_errors() {
    let snapshot = flat(json!({"nodes": [
        {"id": "root", "kind": "category"},
        {"id": "a", "kind": "category", "children": ["b"]},
        {"id": "b", "kind": "category", "children": ["a"]}
    ]}));

    let result = TreeBuilder::new().build(&snapshot);

    assert!(matches!(result, Err(DomainError::CycleDetected(_))));
}

#[test]
fn given_empty_snapshot_when_building_then_empty_tree() {
    let tree = TreeBuilder::new().build(&TreeSnapshot::default()).unwrap();

    assert!(tree.is_empty());
    assert!(tree.leaf_nodes().is_empty());
}
