use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::discovery::builtins::{builtin_class_names, canonical_builtin, BUILTINS_MODULE};
use crate::discovery::class_graph::{finish_discovery, ClassGraph, ClassKey};
use crate::discovery::{Discovery, DiscoveryAdapter};
use crate::errors::{ErrorDetails, ErrorLayer, Result, ToolError};

/// On-disk format of a class manifest.
#[derive(Debug, Deserialize)]
pub struct ManifestJson {
    pub classes: Vec<ManifestClass>,
    /// Modules that exist but define no classes worth listing.
    #[serde(default)]
    pub modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestClass {
    pub module: String,
    pub name: String,
    /// Fully qualified base names, in declaration order.  Bare names are
    /// builtins.
    #[serde(default)]
    pub bases: Vec<String>,
}

/// Discovery from an explicit list of classes, for hierarchies that can't be
/// scanned from source.
pub struct ManifestDiscovery {
    path: PathBuf,
}

impl ManifestDiscovery {
    pub fn new(path: PathBuf) -> Self {
        ManifestDiscovery { path }
    }

    fn read_manifest(&self, target: &str) -> Result<ManifestJson> {
        let text = fs::read_to_string(&self.path).map_err(|err| {
            ToolError::root_resolution(
                target,
                ErrorLayer::DataLayer,
                format!("{}: {}", self.path.display(), err),
            )
        })?;
        serde_json::from_str(&text).map_err(|err| ToolError::RootResolution {
            target: target.to_string(),
            details: ErrorDetails::from(err),
        })
    }
}

fn in_target(module: &str, target: &str) -> bool {
    module == target || (module.starts_with(target) && module[target.len()..].starts_with('.'))
}

fn resolve_base(written: &str, known: &HashSet<ClassKey>) -> ClassKey {
    let (module, name) = match written.rsplit_once('.') {
        Some(split) => split,
        None => {
            return canonical_builtin(written)
                .map(ClassKey::builtin)
                .unwrap_or_else(|| ClassKey::Unresolved(written.to_string()))
        }
    };
    if module == BUILTINS_MODULE {
        if let Some(builtin) = canonical_builtin(name) {
            return ClassKey::builtin(builtin);
        }
    }
    let key = ClassKey::defined(module, name);
    if known.contains(&key) {
        key
    } else {
        ClassKey::Unresolved(written.to_string())
    }
}

/// Turn a parsed manifest into the discovery result for `target`.
pub fn discover_from_manifest(manifest: &ManifestJson, target: &str) -> Result<Discovery> {
    let mut graph = ClassGraph::new();
    if target == BUILTINS_MODULE {
        let candidates: BTreeSet<ClassKey> = builtin_class_names().map(ClassKey::builtin).collect();
        return Ok(finish_discovery(graph, &candidates));
    }

    let known: HashSet<ClassKey> = manifest
        .classes
        .iter()
        .map(|class| ClassKey::defined(&class.module, &class.name))
        .collect();

    let mut candidates = BTreeSet::new();
    for class in &manifest.classes {
        let key = ClassKey::defined(&class.module, &class.name);
        let bases = class.bases.iter().map(|base| resolve_base(base, &known)).collect();
        if in_target(&class.module, target) {
            candidates.insert(key.clone());
        }
        graph.add_class(key, bases);
    }

    let module_known = manifest.modules.iter().any(|module| in_target(module, target));
    if candidates.is_empty() && !module_known {
        return Err(ToolError::root_resolution(
            target,
            ErrorLayer::DataLayer,
            format!("No module named '{}'", target),
        ));
    }
    Ok(finish_discovery(graph, &candidates))
}

impl DiscoveryAdapter for ManifestDiscovery {
    fn discover(&mut self, target: &str) -> Result<Discovery> {
        let span = trace_span!("manifest_discovery", target, manifest = %self.path.display());
        let _span_guard = span.enter();

        let manifest = self.read_manifest(target)?;
        info!(classes = manifest.classes.len(), "read manifest");
        discover_from_manifest(&manifest, target)
    }
}
