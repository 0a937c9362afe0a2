//! Hand-built registries for exercising the engine without going through
//! discovery.

use std::collections::HashMap;

use super::registry::{TypeHandle, TypeRegistry};
use crate::discovery::builtins::{builtin_bases, builtin_class_names, BASE_ERROR, OBJECT};
use crate::discovery::mro::c3_linearize;

pub struct HierarchyFixture {
    pub registry: TypeRegistry,
    pub exception: TypeHandle,
    by_name: HashMap<String, TypeHandle>,
}

impl HierarchyFixture {
    /// A registry pre-populated with the builtin classes.
    pub fn new() -> Self {
        let mut registry = TypeRegistry::new();
        let mut by_name = HashMap::new();
        for name in builtin_class_names() {
            let bases = builtin_bases(name).unwrap_or(&[]);
            declare_class(&mut registry, &mut by_name, name, bases);
        }
        let exception = by_name[BASE_ERROR];
        HierarchyFixture {
            registry,
            exception,
            by_name,
        }
    }

    pub fn lookup(&self, name: &str) -> TypeHandle {
        self.by_name[name]
    }

    /// Declare a class with the given bases, which must already exist.  No
    /// bases means an implicit `object` base, as in Python.
    pub fn class(&mut self, name: &str, bases: &[&str]) -> TypeHandle {
        declare_class(&mut self.registry, &mut self.by_name, name, bases)
    }
}

fn declare_class(
    registry: &mut TypeRegistry,
    by_name: &mut HashMap<String, TypeHandle>,
    name: &str,
    bases: &[&str],
) -> TypeHandle {
    let handle = registry.declare(name);
    let mut parents: Vec<TypeHandle> = bases.iter().map(|base| by_name[*base]).collect();
    if parents.is_empty() && name != OBJECT {
        parents.push(by_name[OBJECT]);
    }
    let base_lins: Vec<Vec<TypeHandle>> = parents
        .iter()
        .map(|&parent| registry.get(parent).ancestor_chain.clone())
        .collect();
    let chain = c3_linearize(handle, &parents, &base_lins).unwrap();
    registry.set_lineage(handle, parents, chain);
    by_name.insert(name.to_string(), handle);
    handle
}
