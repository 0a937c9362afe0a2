use std::fmt;

/// Opaque identity for a type known to a `TypeRegistry`.  Handles are only
/// meaningful for the registry that minted them; two types with the same
/// display name still get distinct handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeHandle(u32);

impl TypeHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single type and its lineage.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    pub handle: TypeHandle,
    pub display_name: String,
    /// Closest first, starting with the type itself and ending at the
    /// universal object type.  This is the method resolution order.
    pub ancestor_chain: Vec<TypeHandle>,
    /// The declared bases in declaration order.  Only used for multi-parent
    /// detection; the tree itself is built from `ancestor_chain`.
    pub direct_parents: Vec<TypeHandle>,
}

/// Owns every type a run knows about: discovered types, their error
/// ancestors, and also mixins and `object` which never make it into a tree.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Mint a new handle.  The type starts out with a chain of just itself and
    /// no parents until `set_lineage` is called.
    pub fn declare(&mut self, display_name: &str) -> TypeHandle {
        let handle = TypeHandle(self.types.len() as u32);
        self.types.push(TypeDescriptor {
            handle,
            display_name: display_name.to_string(),
            ancestor_chain: vec![handle],
            direct_parents: vec![],
        });
        handle
    }

    pub fn set_lineage(
        &mut self,
        handle: TypeHandle,
        direct_parents: Vec<TypeHandle>,
        ancestor_chain: Vec<TypeHandle>,
    ) {
        debug_assert_eq!(ancestor_chain.first(), Some(&handle));
        let desc = &mut self.types[handle.index()];
        desc.direct_parents = direct_parents;
        desc.ancestor_chain = ancestor_chain;
    }

    pub fn get(&self, handle: TypeHandle) -> &TypeDescriptor {
        &self.types[handle.index()]
    }

    pub fn display_name(&self, handle: TypeHandle) -> &str {
        &self.types[handle.index()].display_name
    }

    /// True if `ancestor` appears anywhere in `handle`'s chain, which includes
    /// `handle` itself.
    pub fn is_subtype_of(&self, handle: TypeHandle, ancestor: TypeHandle) -> bool {
        self.get(handle).ancestor_chain.contains(&ancestor)
    }

    /// Every handle this registry has minted, in declaration order.
    pub fn handles(&self) -> impl Iterator<Item = TypeHandle> + '_ {
        self.types.iter().map(|desc| desc.handle)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_follow_declaration_order() {
        let mut registry = TypeRegistry::new();
        assert!(registry.is_empty());
        let object = registry.declare("object");
        let error = registry.declare("Error");
        let twin = registry.declare("Error");
        registry.set_lineage(error, vec![object], vec![error, object]);

        assert_eq!(registry.handles().collect::<Vec<_>>(), vec![object, error, twin]);
        assert_eq!(registry.len(), 3);
        assert_ne!(error, twin);
        assert!(registry.is_subtype_of(error, object));
        assert!(registry.is_subtype_of(twin, twin));
        assert!(!registry.is_subtype_of(twin, object));
    }
}
