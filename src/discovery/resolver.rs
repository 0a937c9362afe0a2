use std::collections::HashSet;
use std::rc::Rc;

use itertools::Itertools;

use crate::discovery::builtins::{canonical_builtin, BUILTINS_MODULE};
use crate::discovery::class_graph::ClassKey;
use crate::discovery::module_loader::{is_dotted_name, LoadedModule, ModuleLoader};
use crate::tree_sitter_support::module_scanner::ImportBinding;

/// Re-export chains longer than this are treated as cycles.
const MAX_INDIRECTIONS: usize = 32;

/// Resolves base class expressions as written in some module to the class
/// they name, loading further modules from the search path as needed.
pub struct SymbolResolver<'l> {
    loader: &'l mut ModuleLoader,
    /// (module, dotted path) lookups currently on the stack.
    active: HashSet<(String, String)>,
}

impl<'l> SymbolResolver<'l> {
    pub fn new(loader: &'l mut ModuleLoader) -> Self {
        SymbolResolver {
            loader,
            active: HashSet::new(),
        }
    }

    /// Resolve `expr` as it would be evaluated at the top level of `module`.
    /// Anything we cannot follow comes back as `ClassKey::Unresolved`, named
    /// by what the module bound it to when that is known.
    pub fn resolve_base(&mut self, module: &LoadedModule, expr: &str) -> ClassKey {
        let resolved = if is_dotted_name(expr) {
            let path: Vec<&str> = expr.split('.').collect();
            match self.resolve_in(module, &path, 0) {
                Some(key) => Ok(key),
                // A module-level binding shadows the builtin even when we
                // cannot see where it leads.
                None => match bound_name(module, &path) {
                    Some(bound) => Err(bound),
                    None => match path.as_slice() {
                        [bare] => canonical_builtin(bare)
                            .map(ClassKey::builtin)
                            .ok_or_else(|| expr.to_string()),
                        _ => Err(expr.to_string()),
                    },
                },
            }
        } else {
            Err(expr.to_string())
        };

        match resolved {
            Ok(key) => {
                trace!(module = module.name.as_str(), expr, resolved = %key, "resolved base");
                key
            }
            Err(written) => {
                debug!(
                    module = module.name.as_str(),
                    file = ?module.path,
                    expr,
                    unresolved = written.as_str(),
                    "unresolved base class"
                );
                ClassKey::Unresolved(written)
            }
        }
    }

    /// Look `path` up as an attribute chain on the module named `module_name`.
    fn resolve_in_named(&mut self, module_name: &str, path: &[&str], depth: usize) -> Option<ClassKey> {
        if module_name == BUILTINS_MODULE {
            return match path {
                [name] => canonical_builtin(name).map(ClassKey::builtin),
                _ => None,
            };
        }
        let module = self.loader.try_load(module_name)?;
        self.resolve_in(&module, path, depth)
    }

    fn resolve_in(&mut self, module: &LoadedModule, path: &[&str], depth: usize) -> Option<ClassKey> {
        let lookup = (module.name.clone(), path.iter().join("."));
        if depth > MAX_INDIRECTIONS || self.active.contains(&lookup) {
            debug!(module = lookup.0.as_str(), path = lookup.1.as_str(), "giving up on cyclic re-exports");
            return None;
        }
        self.active.insert(lookup.clone());
        let resolved = self.lookup_attribute(module, path, depth);
        self.active.remove(&lookup);
        resolved
    }

    fn lookup_attribute(&mut self, module: &LoadedModule, path: &[&str], depth: usize) -> Option<ClassKey> {
        let (first, rest) = path.split_first()?;

        if module.class(first).is_some() {
            // Nested classes are not tracked.
            return match rest {
                [] => Some(ClassKey::defined(&module.name, first)),
                _ => None,
            };
        }

        if let Some(target) = module.alias(first) {
            let mut aliased: Vec<&str> = target.split('.').collect();
            aliased.extend_from_slice(rest);
            return self.resolve_in(module, &aliased, depth + 1);
        }

        if let Some(binding) = module.binding(first) {
            return self.resolve_binding(module, binding, rest, depth);
        }

        // `from m import *` without `__all__` leaves out private names.
        let star_imports: Vec<&str> = if first.starts_with('_') {
            vec![]
        } else {
            module.star_imports().collect()
        };
        for star in star_imports {
            let star_module = match module.absolutize(star) {
                Some(star_module) => star_module,
                None => continue,
            };
            if let Some(key) = self.resolve_in_named(&star_module, path, depth + 1) {
                return Some(key);
            }
        }

        // `pkg.sub.Cls` where `sub` is a submodule reachable as an attribute.
        if module.is_package() && !rest.is_empty() {
            let submodule = format!("{}.{}", module.name, first);
            return self.resolve_in_named(&submodule, rest, depth + 1);
        }

        None
    }

    fn resolve_binding(
        &mut self,
        module: &LoadedModule,
        binding: &ImportBinding,
        rest: &[&str],
        depth: usize,
    ) -> Option<ClassKey> {
        match binding {
            ImportBinding::Module { target, .. } => {
                if rest.is_empty() {
                    return None;
                }
                self.resolve_in_named(target, rest, depth + 1)
            }
            ImportBinding::From { module: from, name, .. } => {
                let source = module.absolutize(from)?;
                let mut path = vec![name.as_str()];
                path.extend_from_slice(rest);
                if let Some(key) = self.resolve_in_named(&source, &path, depth + 1) {
                    return Some(key);
                }
                // `from pkg import sub` may name a submodule.
                if rest.is_empty() {
                    return None;
                }
                let submodule = format!("{}.{}", source, name);
                self.resolve_in_named(&submodule, rest, depth + 1)
            }
            ImportBinding::Star { .. } => None,
        }
    }

    pub fn load(&mut self, module: &str) -> Option<Rc<LoadedModule>> {
        self.loader.try_load(module)
    }
}

/// The dotted name `path` stands for according to whatever statement in
/// `module` binds its first segment, or `None` if nothing there binds it.
fn bound_name(module: &LoadedModule, path: &[&str]) -> Option<String> {
    let (first, rest) = path.split_first()?;
    let head = if module.class(first).is_some() {
        format!("{}.{}", module.name, first)
    } else if let Some(target) = module.alias(first) {
        target.to_string()
    } else {
        match module.binding(first)? {
            ImportBinding::Module { target, .. } => target.clone(),
            ImportBinding::From { module: from, name, .. } => {
                let source = module.absolutize(from).unwrap_or_else(|| from.clone());
                format!("{}.{}", source, name)
            }
            ImportBinding::Star { .. } => return None,
        }
    };
    Some(std::iter::once(head.as_str()).chain(rest.iter().copied()).join("."))
}
