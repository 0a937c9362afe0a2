/*!
The hierarchy engine: turn a set of discovered types, each of which knows its
own ancestor chain, into a rooted tree suitable for printing.

The interesting cases are all about multiple inheritance.  Every node gets
exactly one canonical parent, its nearest ancestor (in resolution order) that
is itself in the tree.  Nodes with more than one direct parent in the tree are
flagged so the renderer can mark them, and can optionally be listed under each
of those parents as a pure rendering fan-out; the canonical parent never
changes.
*/

pub mod builder;
pub mod json;
pub mod registry;
pub mod render;

#[cfg(test)]
pub mod test_support;

pub use builder::{build, ExceptionTree};
pub use registry::{TypeDescriptor, TypeHandle, TypeRegistry};
pub use render::{render_lines, write_tree, RenderOptions};
