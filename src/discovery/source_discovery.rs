use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::discovery::builtins::{builtin_class_names, BUILTINS_MODULE};
use crate::discovery::class_graph::{finish_discovery, ClassGraph, ClassKey};
use crate::discovery::module_loader::{load_root, LoadedModule, ModuleLoader};
use crate::discovery::resolver::SymbolResolver;
use crate::discovery::{Discovery, DiscoveryAdapter};
use crate::errors::{Result, ToolError};

/// Discovers exception classes by statically scanning Python sources found on
/// a search path.
pub struct PythonSourceDiscovery {
    loader: ModuleLoader,
}

impl PythonSourceDiscovery {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        PythonSourceDiscovery {
            loader: ModuleLoader::new(search_paths),
        }
    }

    /// The target module plus, for packages, every submodule that loads.
    fn gather_modules(&mut self, target: &str) -> Result<Vec<std::rc::Rc<LoadedModule>>> {
        let root = load_root(&mut self.loader, target)?;
        let mut modules = vec![root.clone()];
        if !root.is_package() {
            return Ok(modules);
        }

        let mut broken_packages: Vec<String> = vec![];
        for name in self.loader.walk_package(&root) {
            if broken_packages
                .iter()
                .any(|broken| name.starts_with(broken.as_str()) && name[broken.len()..].starts_with('.'))
            {
                continue;
            }
            match self.loader.load(&name) {
                Ok(module) => modules.push(module),
                Err(err @ ToolError::SubUnitResolution { .. }) => {
                    warn!(error = %err, "skipping submodule");
                    broken_packages.push(name);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(modules)
    }
}

impl DiscoveryAdapter for PythonSourceDiscovery {
    fn discover(&mut self, target: &str) -> Result<Discovery> {
        let span = trace_span!("source_discovery", target);
        let _span_guard = span.enter();

        let mut graph = ClassGraph::new();

        if target == BUILTINS_MODULE {
            let candidates: BTreeSet<ClassKey> = builtin_class_names().map(ClassKey::builtin).collect();
            return Ok(finish_discovery(graph, &candidates));
        }

        let modules = self.gather_modules(target)?;
        info!(target, modules = modules.len(), "scanned modules");

        let mut candidates = BTreeSet::new();
        let mut pending: Vec<ClassKey> = vec![];
        for module in &modules {
            for class in &module.syntax.classes {
                let key = ClassKey::defined(&module.name, &class.name);
                candidates.insert(key.clone());
                pending.push(key);
            }
        }

        // Resolve bases transitively, pulling in classes from modules outside
        // the target as they are referenced.
        let mut resolver = SymbolResolver::new(&mut self.loader);
        while let Some(key) = pending.pop() {
            if graph.contains(&key) {
                continue;
            }
            let (module_name, class_name) = match &key {
                ClassKey::Defined { module, name } => (module.clone(), name.clone()),
                _ => continue,
            };
            let module = match resolver.load(&module_name) {
                Some(module) => module,
                None => continue,
            };
            let class = match module.class(&class_name) {
                Some(class) => class,
                None => continue,
            };
            let bases: Vec<ClassKey> = class
                .bases
                .iter()
                .map(|expr| resolver.resolve_base(&module, expr))
                .collect();
            trace!(class = %key, file = ?module.path, line = class.line, bases = bases.len(), "recorded class");
            pending.extend(bases.iter().filter(|base| !graph.contains(base)).cloned());
            graph.add_class(key, bases);
        }

        Ok(finish_discovery(graph, &candidates))
    }
}
