use std::collections::{BTreeSet, HashMap, HashSet};

use super::registry::{TypeHandle, TypeRegistry};

/// The result of tree construction.
///
/// `children` is the rendering contract: every list is sorted by
/// case-insensitive display name and the root is always present as a key.
/// `parents` records the single canonical parent of every non-root node and is
/// left untouched by the duplication pass, so after duplication a node can be
/// listed under more parents than `parents` names.
#[derive(Debug, Clone)]
pub struct ExceptionTree {
    pub root: TypeHandle,
    pub parents: HashMap<TypeHandle, TypeHandle>,
    pub children: HashMap<TypeHandle, Vec<TypeHandle>>,
    pub multi_parents: HashSet<TypeHandle>,
}

impl ExceptionTree {
    pub fn children_of(&self, node: TypeHandle) -> &[TypeHandle] {
        self.children.get(&node).map(|kids| kids.as_slice()).unwrap_or(&[])
    }

    pub fn parent_of(&self, node: TypeHandle) -> Option<TypeHandle> {
        self.parents.get(&node).copied()
    }

    pub fn is_multi_parent(&self, node: TypeHandle) -> bool {
        self.multi_parents.contains(&node)
    }

    /// Number of distinct nodes, root included.
    pub fn node_count(&self) -> usize {
        self.parents.len() + 1
    }
}

/// Build the inheritance tree rooted at `root` spanning every type in
/// `discovered` and all of their ancestors that derive from `root`.
///
/// With `duplicate_multi_parents`, nodes with more than one direct parent in
/// the tree are additionally listed under each of those parents.
pub fn build(
    registry: &TypeRegistry,
    root: TypeHandle,
    discovered: &[TypeHandle],
    duplicate_multi_parents: bool,
) -> ExceptionTree {
    let span = trace_span!("build_tree", discovered = discovered.len(), duplicate_multi_parents);
    let _span_guard = span.enter();

    let nodes = gather_nodes(registry, root, discovered);
    let parents = build_parent_map(registry, root, &nodes);
    let mut children = invert_parent_map(root, &parents);
    sort_children(registry, &mut children);

    let multi_parents = detect_multi_parents(registry, root, &nodes);

    if duplicate_multi_parents {
        duplicate_under_each_parent(registry, &mut children, &multi_parents, &nodes);
        sort_children(registry, &mut children);
    }

    debug!(
        nodes = nodes.len(),
        multi_parents = multi_parents.len(),
        "built exception tree"
    );

    ExceptionTree {
        root,
        parents,
        children,
        multi_parents,
    }
}

// A BTreeSet keeps every later pass iterating in handle order.
fn gather_nodes(
    registry: &TypeRegistry,
    root: TypeHandle,
    discovered: &[TypeHandle],
) -> BTreeSet<TypeHandle> {
    let mut nodes = BTreeSet::new();
    nodes.insert(root);
    for &handle in discovered {
        for &ancestor in &registry.get(handle).ancestor_chain {
            // Mixins, `object` and anything above the root are not part of the
            // error lineage; skip them but keep walking since error bases can
            // follow a mixin in the chain.
            if registry.is_subtype_of(ancestor, root) {
                nodes.insert(ancestor);
            }
        }
    }
    nodes
}

fn build_parent_map(
    registry: &TypeRegistry,
    root: TypeHandle,
    nodes: &BTreeSet<TypeHandle>,
) -> HashMap<TypeHandle, TypeHandle> {
    let mut parents = HashMap::new();
    for &node in nodes {
        if node == root {
            continue;
        }
        let parent = registry
            .get(node)
            .ancestor_chain
            .iter()
            .skip(1)
            .find(|ancestor| nodes.contains(ancestor));
        match parent {
            Some(&parent) => {
                parents.insert(node, parent);
            }
            // The root is in every node's chain, so this is a broken registry.
            None => panic!(
                "{} ({}) has no ancestor in the tree; its chain does not reach the root",
                registry.display_name(node),
                node
            ),
        }
    }
    parents
}

fn invert_parent_map(
    root: TypeHandle,
    parents: &HashMap<TypeHandle, TypeHandle>,
) -> HashMap<TypeHandle, Vec<TypeHandle>> {
    let mut children: HashMap<TypeHandle, Vec<TypeHandle>> = HashMap::new();
    children.insert(root, vec![]);
    for (&child, &parent) in parents {
        children.entry(parent).or_default().push(child);
    }
    children
}

/// Case-insensitive display name order.  Exact name and then handle break
/// ties so the order never depends on hash map iteration.
fn sort_children(registry: &TypeRegistry, children: &mut HashMap<TypeHandle, Vec<TypeHandle>>) {
    for kids in children.values_mut() {
        kids.sort_by_cached_key(|&kid| {
            let name = registry.display_name(kid);
            (name.to_lowercase(), name.to_string(), kid)
        });
    }
}

fn tracked_direct_parents<'a>(
    registry: &'a TypeRegistry,
    node: TypeHandle,
    nodes: &'a BTreeSet<TypeHandle>,
) -> impl Iterator<Item = TypeHandle> + 'a {
    let mut seen = HashSet::new();
    registry
        .get(node)
        .direct_parents
        .iter()
        .copied()
        .filter(move |parent| nodes.contains(parent) && seen.insert(*parent))
}

fn detect_multi_parents(
    registry: &TypeRegistry,
    root: TypeHandle,
    nodes: &BTreeSet<TypeHandle>,
) -> HashSet<TypeHandle> {
    nodes
        .iter()
        .copied()
        .filter(|&node| node != root && tracked_direct_parents(registry, node, nodes).count() > 1)
        .collect()
}

fn duplicate_under_each_parent(
    registry: &TypeRegistry,
    children: &mut HashMap<TypeHandle, Vec<TypeHandle>>,
    multi_parents: &HashSet<TypeHandle>,
    nodes: &BTreeSet<TypeHandle>,
) {
    let mut ordered: Vec<TypeHandle> = multi_parents.iter().copied().collect();
    ordered.sort();
    for node in ordered {
        for parent in tracked_direct_parents(registry, node, nodes) {
            let kids = children.entry(parent).or_default();
            if !kids.contains(&node) {
                trace!(node = registry.display_name(node), parent = registry.display_name(parent), "duplicating");
                kids.push(node);
            }
        }
    }
}
