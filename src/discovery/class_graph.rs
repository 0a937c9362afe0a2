use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::discovery::builtins::{builtin_bases, builtin_class_names, BASE_ERROR, OBJECT};
use crate::discovery::mro::{c3_linearize, depth_first_linearize};
use crate::discovery::Discovery;
use crate::hierarchy::{TypeHandle, TypeRegistry};

/// Identity of a class before it is handed to the registry.  The derived
/// ordering is what makes handle assignment (and so everything downstream)
/// deterministic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassKey {
    Builtin(String),
    Defined { module: String, name: String },
    /// A base expression we could not resolve, kept as written.
    Unresolved(String),
}

impl ClassKey {
    pub fn builtin(name: &str) -> Self {
        ClassKey::Builtin(name.to_string())
    }

    pub fn defined(module: &str, name: &str) -> Self {
        ClassKey::Defined {
            module: module.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKey::Builtin(name) => write!(f, "{}", name),
            ClassKey::Defined { module, name } => write!(f, "{}.{}", module, name),
            ClassKey::Unresolved(written) => write!(f, "{}", written),
        }
    }
}

/// Every class we know about and its resolved direct bases.
pub struct ClassGraph {
    bases: BTreeMap<ClassKey, Vec<ClassKey>>,
}

impl Default for ClassGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassGraph {
    /// A graph holding just the builtin classes.
    pub fn new() -> Self {
        let bases = builtin_class_names()
            .map(|name| {
                let parents = builtin_bases(name)
                    .unwrap_or(&[])
                    .iter()
                    .map(|base| ClassKey::builtin(base))
                    .collect();
                (ClassKey::builtin(name), parents)
            })
            .collect();
        ClassGraph { bases }
    }

    pub fn contains(&self, key: &ClassKey) -> bool {
        self.bases.contains_key(key)
    }

    /// Record `key` with its direct bases.  Unresolved bases are recorded as
    /// opaque classes deriving from `object`.
    pub fn add_class(&mut self, key: ClassKey, bases: Vec<ClassKey>) {
        for base in &bases {
            if let ClassKey::Unresolved(_) = base {
                self.bases.entry(base.clone()).or_default();
            }
        }
        self.bases.insert(key, bases);
    }

    /// Declare every class in the registry and compute its ancestor chain.
    /// Bases that were never added themselves are treated as opaque.
    pub fn into_registry(mut self) -> (TypeRegistry, HashMap<ClassKey, TypeHandle>) {
        let missing: Vec<ClassKey> = self
            .bases
            .values()
            .flatten()
            .filter(|base| !self.bases.contains_key(base))
            .cloned()
            .collect();
        for key in missing {
            self.bases.entry(key).or_default();
        }

        let mut registry = TypeRegistry::new();
        let mut handles = HashMap::new();
        for key in self.bases.keys() {
            handles.insert(key.clone(), registry.declare(&key.to_string()));
        }

        let mut linearizer = Linearizer {
            graph: &self,
            handles: &handles,
            chains: HashMap::new(),
            parents: HashMap::new(),
            in_progress: BTreeSet::new(),
        };
        for key in self.bases.keys() {
            linearizer.linearize(key);
        }

        let Linearizer { chains, parents, .. } = linearizer;
        for (key, chain) in chains {
            let handle = handles[&key];
            let direct = parents.get(&key).cloned().unwrap_or_default();
            registry.set_lineage(handle, direct, chain);
        }
        (registry, handles)
    }
}

struct Linearizer<'a> {
    graph: &'a ClassGraph,
    handles: &'a HashMap<ClassKey, TypeHandle>,
    chains: HashMap<ClassKey, Vec<TypeHandle>>,
    parents: HashMap<ClassKey, Vec<TypeHandle>>,
    in_progress: BTreeSet<ClassKey>,
}

impl<'a> Linearizer<'a> {
    fn linearize(&mut self, key: &ClassKey) -> Vec<TypeHandle> {
        if let Some(chain) = self.chains.get(key) {
            return chain.clone();
        }
        let handle = self.handles[key];
        self.in_progress.insert(key.clone());

        let object = ClassKey::builtin(OBJECT);
        let mut bases: Vec<ClassKey> = vec![];
        for base in self.graph.bases.get(key).into_iter().flatten() {
            if self.in_progress.contains(base) {
                warn!(class = %key, base = %base, "ignoring cyclic base class");
                continue;
            }
            if !bases.contains(base) {
                bases.push(base.clone());
            }
        }
        if bases.is_empty() && *key != object {
            bases.push(object);
        }

        let base_lins: Vec<Vec<TypeHandle>> = bases.iter().map(|base| self.linearize(base)).collect();
        let base_handles: Vec<TypeHandle> = bases.iter().map(|base| self.handles[base]).collect();
        let chain = match c3_linearize(handle, &base_handles, &base_lins) {
            Some(chain) => chain,
            None => {
                warn!(class = %key, "inconsistent method resolution order, using depth-first order");
                depth_first_linearize(handle, &base_lins)
            }
        };

        self.in_progress.remove(key);
        self.parents.insert(key.clone(), base_handles);
        self.chains.insert(key.clone(), chain.clone());
        chain
    }
}

/// Package up a finished graph.  `candidates` are the classes the target
/// defines; only those deriving from `Exception` are reported.
pub fn finish_discovery(graph: ClassGraph, candidates: &BTreeSet<ClassKey>) -> Discovery {
    let (registry, handles) = graph.into_registry();
    let root = handles[&ClassKey::builtin(BASE_ERROR)];
    let discovered: Vec<TypeHandle> = candidates
        .iter()
        .filter_map(|key| handles.get(key).copied())
        .filter(|&handle| registry.is_subtype_of(handle, root))
        .collect();
    let error_types = registry
        .handles()
        .filter(|&handle| registry.is_subtype_of(handle, root))
        .count();
    debug!(
        classes = registry.len(),
        error_types,
        candidates = candidates.len(),
        discovered = discovered.len(),
        "class graph complete"
    );
    Discovery {
        registry,
        root,
        discovered,
    }
}
