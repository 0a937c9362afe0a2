use std::io::{self, Write};

use super::builder::ExceptionTree;
use super::registry::{TypeHandle, TypeRegistry};

const MID_BRANCH: &str = "├── ";
const END_BRANCH: &str = "└── ";
const CONTINUATION: &str = "│   ";
const BLANK: &str = "    ";
const SEPARATOR: &str = "|";
/// Appended to every occurrence of a node with more than one direct parent in
/// the tree.
pub const MULTI_PARENT_MARKER: &str = " *";

#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Suppress the `|` separator lines.
    pub compact: bool,
}

/// Render the tree into lines, without trailing newlines.
pub fn render_lines(tree: &ExceptionTree, registry: &TypeRegistry, options: RenderOptions) -> Vec<String> {
    let mut renderer = LineRenderer {
        tree,
        registry,
        options,
        lines: vec![],
    };
    renderer.render_root();
    renderer.lines
}

/// Write the rendered tree to `out`, one line per node or separator.
pub fn write_tree<W: Write>(
    tree: &ExceptionTree,
    registry: &TypeRegistry,
    options: RenderOptions,
    out: &mut W,
) -> io::Result<()> {
    for line in render_lines(tree, registry, options) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

struct LineRenderer<'a> {
    tree: &'a ExceptionTree,
    registry: &'a TypeRegistry,
    options: RenderOptions,
    lines: Vec<String>,
}

impl<'a> LineRenderer<'a> {
    fn render_root(&mut self) {
        let tree = self.tree;
        let root = tree.root;
        self.lines.push(self.registry.display_name(root).to_string());

        let kids = tree.children_of(root);
        for (idx, &child) in kids.iter().enumerate() {
            // The root has no siblings of its own, so every one of its children
            // gets a separator.
            if !self.options.compact {
                self.lines.push(SEPARATOR.to_string());
            }
            let last = idx == kids.len() - 1;
            self.push_node_line("", child, last);
            self.render_subtree(child, &child_indent("", last));
        }
    }

    fn render_subtree(&mut self, node: TypeHandle, indent: &str) {
        let tree = self.tree;
        let kids = tree.children_of(node);
        for (idx, &child) in kids.iter().enumerate() {
            // Visually close off the previous sibling's subtree.
            if !self.options.compact && idx > 0 && !tree.children_of(kids[idx - 1]).is_empty() {
                self.lines.push(format!("{}{}", indent, SEPARATOR));
            }
            let last = idx == kids.len() - 1;
            self.push_node_line(indent, child, last);
            if !tree.children_of(child).is_empty() {
                self.render_subtree(child, &child_indent(indent, last));
            }
        }
    }

    fn push_node_line(&mut self, indent: &str, node: TypeHandle, last: bool) {
        let branch = if last { END_BRANCH } else { MID_BRANCH };
        let suffix = if self.tree.is_multi_parent(node) {
            MULTI_PARENT_MARKER
        } else {
            ""
        };
        self.lines.push(format!(
            "{}{}{}{}",
            indent,
            branch,
            self.registry.display_name(node),
            suffix
        ));
    }
}

fn child_indent(indent: &str, last: bool) -> String {
    format!("{}{}", indent, if last { BLANK } else { CONTINUATION })
}
