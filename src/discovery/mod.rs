//! Finding the exception classes a target module defines.
//!
//! Discovery is the boundary between the outside world and the hierarchy
//! engine: whatever the source of class information, it produces a
//! `TypeRegistry` with every relevant class's ancestor chain, the handle of the
//! base error type and the handles the target itself defines.

use std::path::PathBuf;

use crate::errors::Result;
use crate::hierarchy::{TypeHandle, TypeRegistry};

pub mod builtins;
pub mod class_graph;
pub mod manifest;
pub mod module_loader;
pub mod mro;
pub mod resolver;
pub mod source_discovery;

#[cfg(test)]
pub mod test_support;

pub struct Discovery {
    pub registry: TypeRegistry,
    /// Python's `Exception`.
    pub root: TypeHandle,
    /// Subtypes of `root` defined by the target, in qualified name order.
    pub discovered: Vec<TypeHandle>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }
}

pub trait DiscoveryAdapter {
    /// Enumerate the error types reachable from `target`, a dotted module or
    /// package name.  Failing to load `target` itself is a
    /// `ToolError::RootResolution`.
    fn discover(&mut self, target: &str) -> Result<Discovery>;
}

/// Discovery by scanning Python sources found under `search_paths`, searched
/// in order.
pub fn make_source_discovery(search_paths: Vec<PathBuf>) -> Box<dyn DiscoveryAdapter> {
    Box::new(source_discovery::PythonSourceDiscovery::new(search_paths))
}

/// Discovery from a JSON class manifest.  The file is only read once
/// `discover` is called.
pub fn make_manifest_discovery(path: PathBuf) -> Box<dyn DiscoveryAdapter> {
    Box::new(manifest::ManifestDiscovery::new(path))
}
