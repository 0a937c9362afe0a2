use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use walkdir::WalkDir;

use crate::errors::{ErrorLayer, Result, ToolError};
use crate::tree_sitter_support::module_scanner::{scan_module, ClassSyntax, ImportBinding, ModuleSyntax};

/// A module we located on the search path and scanned.
#[derive(Debug)]
pub struct LoadedModule {
    pub name: String,
    /// The `.py` file, or `None` for a namespace package.
    pub path: Option<PathBuf>,
    /// Directory holding the submodules if this is a package.
    pub package_dir: Option<PathBuf>,
    pub syntax: ModuleSyntax,
}

impl LoadedModule {
    pub fn is_package(&self) -> bool {
        self.package_dir.is_some()
    }

    pub fn class(&self, name: &str) -> Option<&ClassSyntax> {
        self.syntax.classes.iter().rev().find(|class| class.name == name)
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.syntax
            .aliases
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, target)| target.as_str())
    }

    /// The last import statement binding `name`.
    pub fn binding(&self, name: &str) -> Option<&ImportBinding> {
        self.syntax.imports.iter().rev().find(|binding| match binding {
            ImportBinding::Module { local, .. } => local == name,
            ImportBinding::From { local, .. } => local == name,
            ImportBinding::Star { .. } => false,
        })
    }

    pub fn star_imports(&self) -> impl Iterator<Item = &str> {
        self.syntax.imports.iter().filter_map(|binding| match binding {
            ImportBinding::Star { module } => Some(module.as_str()),
            _ => None,
        })
    }

    /// Turn a possibly relative module reference made from inside this module
    /// into an absolute dotted name.
    pub fn absolutize(&self, reference: &str) -> Option<String> {
        let dots = reference.chars().take_while(|&c| c == '.').count();
        if dots == 0 {
            return Some(reference.to_string());
        }
        let remainder = &reference[dots..];

        let mut base: Vec<&str> = self.name.split('.').collect();
        if !self.is_package() {
            base.pop();
        }
        for _ in 1..dots {
            base.pop()?;
        }
        if base.is_empty() {
            // "attempted relative import beyond top-level package"
            return None;
        }
        let mut absolute = base.join(".");
        if !remainder.is_empty() {
            absolute.push('.');
            absolute.push_str(remainder);
        }
        Some(absolute)
    }
}

pub fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

pub fn is_dotted_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

enum Located {
    Module(PathBuf),
    Package { init: PathBuf, dir: PathBuf },
    Namespace(PathBuf),
}

/// Finds modules on an ordered list of search directories, mirroring how
/// Python's path finder picks the first directory that has a match, and keeps
/// every scan result (good or bad) for the rest of the run.
pub struct ModuleLoader {
    search_paths: Vec<PathBuf>,
    cache: HashMap<String, std::result::Result<Rc<LoadedModule>, String>>,
}

impl ModuleLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        ModuleLoader {
            search_paths,
            cache: HashMap::new(),
        }
    }

    fn locate(&self, module: &str) -> Option<Located> {
        let segments: Vec<&str> = module.split('.').collect();
        let mut namespace = None;
        for dir in &self.search_paths {
            let mut base = dir.clone();
            base.extend(&segments);

            let init = base.join("__init__.py");
            if init.is_file() {
                return Some(Located::Package { init, dir: base });
            }
            let file = base.with_extension("py");
            if file.is_file() {
                return Some(Located::Module(file));
            }
            if namespace.is_none() && base.is_dir() {
                namespace = Some(base);
            }
        }
        // A bare directory only counts once no regular module matched anywhere.
        namespace.map(Located::Namespace)
    }

    /// Load and scan `module`, reporting any failure as a sub-unit problem.
    /// Callers loading the requested root convert that into a root failure.
    pub fn load(&mut self, module: &str) -> Result<Rc<LoadedModule>> {
        if let Some(cached) = self.cache.get(module) {
            return cached
                .clone()
                .map_err(|message| ToolError::sub_unit(module, message));
        }

        let span = trace_span!("load_module", module);
        let _span_guard = span.enter();

        let loaded = self.load_uncached(module);
        if let Err(message) = &loaded {
            debug!(module, error = message.as_str(), "module failed to load");
        }
        self.cache.insert(module.to_string(), loaded.clone());
        loaded.map_err(|message| ToolError::sub_unit(module, message))
    }

    /// `load` for callers that treat a missing module as "can't resolve".
    pub fn try_load(&mut self, module: &str) -> Option<Rc<LoadedModule>> {
        self.load(module).ok()
    }

    fn load_uncached(&self, module: &str) -> std::result::Result<Rc<LoadedModule>, String> {
        if !is_dotted_name(module) {
            return Err(format!("'{}' is not a valid module name", module));
        }

        let (path, package_dir) = match self.locate(module) {
            Some(Located::Module(path)) => (Some(path), None),
            Some(Located::Package { init, dir }) => (Some(init), Some(dir)),
            Some(Located::Namespace(dir)) => (None, Some(dir)),
            None => return Err(format!("No module named '{}'", module)),
        };

        let syntax = match &path {
            Some(path) => {
                let source = fs::read_to_string(path)
                    .map_err(|err| format!("{}: {}", path.display(), err))?;
                scan_module(&source).map_err(|err| format!("{}: {}", path.display(), err))?
            }
            None => ModuleSyntax::default(),
        };

        Ok(Rc::new(LoadedModule {
            name: module.to_string(),
            path,
            package_dir,
            syntax,
        }))
    }

    /// Names of every module below `package`, recursively, in sorted order so
    /// that a subpackage always precedes its own submodules.  Like
    /// `pkgutil.walk_packages`, only directories with an `__init__.py` are
    /// descended into and only `.py` files count as modules.
    pub fn walk_package(&self, package: &LoadedModule) -> Vec<String> {
        let package_dir = match &package.package_dir {
            Some(dir) => dir,
            None => return vec![],
        };

        let walker = WalkDir::new(package_dir)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !entry.file_type().is_dir() || entry.path().join("__init__.py").is_file()
            });

        let mut names = vec![];
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(package = package.name.as_str(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if let Some(name) = submodule_name(&package.name, package_dir, entry.path(), entry.file_type().is_dir()) {
                names.push(name);
            }
        }
        names.sort();
        names
    }
}

fn submodule_name(package: &str, package_dir: &Path, path: &Path, is_dir: bool) -> Option<String> {
    let rel_path = path.strip_prefix(package_dir).ok()?;
    let mut segments = vec![package.to_string()];
    let components: Vec<&str> = rel_path
        .iter()
        .map(|component| component.to_str())
        .collect::<Option<Vec<&str>>>()?;
    let (last, parents) = components.split_last()?;

    for parent in parents {
        segments.push(parent.to_string());
    }
    if is_dir {
        segments.push(last.to_string());
    } else {
        let stem = last.strip_suffix(".py")?;
        if stem == "__init__" {
            return None;
        }
        segments.push(stem.to_string());
    }

    // Python could never import these by name.
    if segments[1..].iter().any(|segment| segment.contains('.')) {
        return None;
    }
    Some(segments.join("."))
}

/// Load the requested root module, turning any failure into the fatal root
/// resolution error.
pub fn load_root(loader: &mut ModuleLoader, target: &str) -> Result<Rc<LoadedModule>> {
    if !is_dotted_name(target) {
        return Err(ToolError::root_resolution(
            target,
            ErrorLayer::BadInput,
            format!("'{}' is not a valid module name", target),
        ));
    }
    loader.load(target).map_err(|err| match err {
        ToolError::SubUnitResolution { details, .. } => ToolError::RootResolution {
            target: target.to_string(),
            details,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::test_support::make_tree;

    #[test]
    fn test_locates_modules_and_packages() {
        let dir = make_tree(&[
            ("pkg/__init__.py", ""),
            ("pkg/errors.py", "class E(Exception): pass\n"),
            ("single.py", "X = 1\n"),
        ]);
        let mut loader = ModuleLoader::new(vec![dir.path().to_path_buf()]);

        let pkg = loader.load("pkg").unwrap();
        assert!(pkg.is_package());
        let errors = loader.load("pkg.errors").unwrap();
        assert!(!errors.is_package());
        assert_eq!(errors.class("E").unwrap().bases, vec!["Exception".to_string()]);
        assert!(loader.load("single").is_ok());

        match loader.load("missing") {
            Err(ToolError::SubUnitResolution { details, .. }) => {
                assert_eq!(details.message, "No module named 'missing'")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_first_search_path_wins() {
        let first = make_tree(&[("dup.py", "class First(Exception): pass\n")]);
        let second = make_tree(&[("dup.py", "class Second(Exception): pass\n")]);
        let mut loader = ModuleLoader::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        let dup = loader.load("dup").unwrap();
        assert!(dup.class("First").is_some());
        assert!(dup.class("Second").is_none());
    }

    #[test]
    fn test_walk_package() {
        let dir = make_tree(&[
            ("pkg/__init__.py", ""),
            ("pkg/Upper.py", ""),
            ("pkg/errors.py", ""),
            ("pkg/sub/__init__.py", ""),
            ("pkg/sub/deep.py", ""),
            ("pkg/not_a_package/orphan.py", ""),
            ("pkg/notes.txt", ""),
            ("pkg/weird.name.py", ""),
        ]);
        let mut loader = ModuleLoader::new(vec![dir.path().to_path_buf()]);
        let pkg = loader.load("pkg").unwrap();
        assert_eq!(
            loader.walk_package(&pkg),
            vec!["pkg.Upper", "pkg.errors", "pkg.sub", "pkg.sub.deep"]
        );
    }

    #[test]
    fn test_absolutize() {
        let module = LoadedModule {
            name: "pkg.sub.mod".to_string(),
            path: None,
            package_dir: None,
            syntax: ModuleSyntax::default(),
        };
        assert_eq!(module.absolutize("os").as_deref(), Some("os"));
        assert_eq!(module.absolutize(".").as_deref(), Some("pkg.sub"));
        assert_eq!(module.absolutize(".errors").as_deref(), Some("pkg.sub.errors"));
        assert_eq!(module.absolutize("..base").as_deref(), Some("pkg.base"));
        assert_eq!(module.absolutize("....too_far"), None);

        let package = LoadedModule {
            name: "pkg".to_string(),
            path: None,
            package_dir: Some(PathBuf::from("pkg")),
            syntax: ModuleSyntax::default(),
        };
        assert_eq!(package.absolutize(".errors").as_deref(), Some("pkg.errors"));
    }

    #[test]
    fn test_root_failures() {
        let dir = make_tree(&[("broken.py", "class (:\n")]);
        let mut loader = ModuleLoader::new(vec![dir.path().to_path_buf()]);
        assert!(matches!(
            load_root(&mut loader, "broken"),
            Err(ToolError::RootResolution { .. })
        ));
        match load_root(&mut loader, "not-valid") {
            Err(ToolError::RootResolution { details, .. }) => assert_eq!(details.layer, ErrorLayer::BadInput),
            other => panic!("unexpected {:?}", other),
        }
    }
}
