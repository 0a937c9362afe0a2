use serde::Serialize;
use serde_json::Value;

use super::builder::ExceptionTree;
use super::registry::{TypeHandle, TypeRegistry};

/// Serializable mirror of the rendered tree.  Follows exactly the same
/// traversal as the text renderer, so duplicated nodes show up (with their
/// subtrees) under every parent they were listed under.
#[derive(Debug, Serialize)]
pub struct JsonTreeNode {
    pub name: String,
    pub multi_parent: bool,
    pub children: Vec<JsonTreeNode>,
}

pub fn tree_to_nodes(tree: &ExceptionTree, registry: &TypeRegistry) -> JsonTreeNode {
    node_for(tree, registry, tree.root)
}

pub fn tree_to_json(tree: &ExceptionTree, registry: &TypeRegistry) -> Value {
    // Serializing plain strings, bools and vecs cannot fail.
    serde_json::to_value(tree_to_nodes(tree, registry)).unwrap_or(Value::Null)
}

fn node_for(tree: &ExceptionTree, registry: &TypeRegistry, node: TypeHandle) -> JsonTreeNode {
    JsonTreeNode {
        name: registry.display_name(node).to_string(),
        multi_parent: tree.is_multi_parent(node),
        children: tree
            .children_of(node)
            .iter()
            .map(|&kid| node_for(tree, registry, kid))
            .collect(),
    }
}
