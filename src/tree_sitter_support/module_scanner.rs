use tree_sitter::{Node, Parser};

/// A class statement found at module level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSyntax {
    pub name: String,
    /// Positional base expressions in declaration order.  Dotted names are
    /// normalized (`errors . Base` becomes `errors.Base`); anything more
    /// exotic is kept as its source text and will fail to resolve.
    pub bases: Vec<String>,
    /// 1-based.
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportBinding {
    /// `import a.b` binds `a` to the module `a`; `import a.b as x` binds `x` to
    /// the module `a.b`.
    Module { local: String, target: String },
    /// `from m import n as k` binds `k` to `n` looked up in `m`.  Relative
    /// module names keep their leading dots.
    From {
        local: String,
        module: String,
        name: String,
    },
    /// `from m import *`
    Star { module: String },
}

/// Everything about a module's top level that matters for resolving classes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleSyntax {
    pub classes: Vec<ClassSyntax>,
    pub imports: Vec<ImportBinding>,
    /// Module-level `Name = dotted.name` assignments.
    pub aliases: Vec<(String, String)>,
}

/// Node kinds whose statements execute at module level.  Function and class
/// bodies are deliberately absent.
const MODULE_LEVEL_CONTAINERS: &[&str] = &[
    "module",
    "block",
    "if_statement",
    "elif_clause",
    "else_clause",
    "try_statement",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "with_statement",
    "decorated_definition",
];

/// Parse one Python module and collect its module-level class definitions,
/// imports and aliases.  Source that does not parse cleanly is an error since
/// Python would refuse to import it.
pub fn scan_module(source: &str) -> Result<ModuleSyntax, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| format!("Error loading Python grammar: {:?}", err))?;

    let parse_tree = match parser.parse(source.as_bytes(), None) {
        Some(t) => t,
        _ => {
            return Err("Parse failed!".to_string());
        }
    };

    let root = parse_tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(0);
        return Err(format!("invalid syntax (line {})", line));
    }

    let mut scanner = ModuleScanner {
        source: source.as_bytes(),
        syntax: ModuleSyntax::default(),
    };
    scanner.visit(root);
    Ok(scanner.syntax)
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let kids: Vec<Node> = node.children(&mut cursor).collect();
    kids.into_iter()
        .filter(|kid| kid.has_error())
        .find_map(first_error_line)
}

struct ModuleScanner<'s> {
    source: &'s [u8],
    syntax: ModuleSyntax,
}

impl<'s> ModuleScanner<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    /// Source text with all whitespace removed, for dotted names and relative
    /// import prefixes.
    fn compact_text(&self, node: Node) -> String {
        self.text(node).chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "class_definition" => self.visit_class(node),
            "import_statement" => self.visit_import(node),
            "import_from_statement" => self.visit_import_from(node),
            "expression_statement" => self.visit_expression_statement(node),
            kind if MODULE_LEVEL_CONTAINERS.contains(&kind) => {
                let mut cursor = node.walk();
                let kids: Vec<Node> = node.named_children(&mut cursor).collect();
                for kid in kids {
                    self.visit(kid);
                }
            }
            _ => {}
        }
    }

    fn visit_class(&mut self, node: Node) {
        let name = match node.child_by_field_name("name") {
            Some(name) => self.text(name).to_string(),
            None => return,
        };

        let mut bases = vec![];
        if let Some(arg_list) = node.child_by_field_name("superclasses") {
            let mut cursor = arg_list.walk();
            for arg in arg_list.named_children(&mut cursor) {
                match arg.kind() {
                    // metaclass=..., *bases and **kwargs are not bases we can
                    // see statically.
                    "keyword_argument" | "list_splat" | "dictionary_splat" | "comment" => {}
                    _ => bases.push(self.base_expression(arg)),
                }
            }
        }

        trace!(class = name.as_str(), ?bases, "found class");
        self.syntax.classes.push(ClassSyntax {
            name,
            bases,
            line: node.start_position().row + 1,
        });
    }

    fn base_expression(&self, node: Node) -> String {
        match node.kind() {
            // `Generic[T]` and friends inherit from the subscripted value.
            "subscript" => match node.child_by_field_name("value") {
                Some(value) => self.base_expression(value),
                None => self.text(node).to_string(),
            },
            _ => self
                .dotted_name(node)
                .unwrap_or_else(|| self.text(node).to_string()),
        }
    }

    /// `a.b.c` for identifiers and attribute chains of identifiers.
    fn dotted_name(&self, node: Node) -> Option<String> {
        match node.kind() {
            "identifier" => Some(self.text(node).to_string()),
            "dotted_name" => Some(self.compact_text(node)),
            "attribute" => {
                let object = self.dotted_name(node.child_by_field_name("object")?)?;
                let attribute = node.child_by_field_name("attribute")?;
                Some(format!("{}.{}", object, self.text(attribute)))
            }
            _ => None,
        }
    }

    fn visit_import(&mut self, node: Node) {
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let binding = match name.kind() {
                "aliased_import" => {
                    let target = match name.child_by_field_name("name") {
                        Some(target) => self.compact_text(target),
                        None => continue,
                    };
                    let local = match name.child_by_field_name("alias") {
                        Some(alias) => self.text(alias).to_string(),
                        None => continue,
                    };
                    ImportBinding::Module { local, target }
                }
                _ => {
                    // `import a.b.c` binds only the top-level package.
                    let dotted = self.compact_text(name);
                    let top = dotted.split('.').next().unwrap_or_default().to_string();
                    ImportBinding::Module {
                        local: top.clone(),
                        target: top,
                    }
                }
            };
            self.syntax.imports.push(binding);
        }
    }

    fn visit_import_from(&mut self, node: Node) {
        let module = match node.child_by_field_name("module_name") {
            Some(module) => self.compact_text(module),
            None => return,
        };

        let mut cursor = node.walk();
        let kids: Vec<Node> = node.named_children(&mut cursor).collect();
        if kids.iter().any(|kid| kid.kind() == "wildcard_import") {
            self.syntax.imports.push(ImportBinding::Star { module });
            return;
        }

        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let (imported, local) = match name.kind() {
                "aliased_import" => {
                    let imported = match name.child_by_field_name("name") {
                        Some(imported) => self.compact_text(imported),
                        None => continue,
                    };
                    let local = match name.child_by_field_name("alias") {
                        Some(alias) => self.text(alias).to_string(),
                        None => continue,
                    };
                    (imported, local)
                }
                _ => {
                    let imported = self.compact_text(name);
                    (imported.clone(), imported)
                }
            };
            self.syntax.imports.push(ImportBinding::From {
                local,
                module: module.clone(),
                name: imported,
            });
        }
    }

    fn visit_expression_statement(&mut self, node: Node) {
        let mut cursor = node.walk();
        let kids: Vec<Node> = node.named_children(&mut cursor).collect();
        for kid in kids {
            if kid.kind() != "assignment" {
                continue;
            }
            let left = kid.child_by_field_name("left");
            let right = kid.child_by_field_name("right");
            if let (Some(left), Some(right)) = (left, right) {
                if left.kind() != "identifier" {
                    continue;
                }
                if let Some(target) = self.dotted_name(right) {
                    self.syntax
                        .aliases
                        .push((self.text(left).to_string(), target));
                }
            }
        }
    }
}
