//! Python structure parser using tree-sitter.
//!
//! Parsing is all-or-nothing: a tree containing any `ERROR` or `MISSING`
//! node fails with `SyntaxInvalid` and no module is produced. Source the
//! grammar accepts but Python 3 rejects fails the same way.

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::error::{Error, Result};
use crate::model::{Class, Function, Import, Language, Module, Parameter};

use super::{
    clean_concatenated_docstring, clean_docstring, decorator_text, end_line, first_error,
    line_count, start_line, ParsedFile, StructureParser,
};

/// Statements the parser acts on, at module level and in class bodies.
enum Statement<'t> {
    Function(Node<'t>),
    Class(Node<'t>),
    Decorated(Node<'t>),
    Import(Node<'t>),
    FromImport(Node<'t>),
    FutureImport(Node<'t>),
    Other,
}

impl<'t> Statement<'t> {
    fn classify(node: Node<'t>) -> Self {
        match node.kind() {
            "function_definition" => Statement::Function(node),
            "class_definition" => Statement::Class(node),
            "decorated_definition" => Statement::Decorated(node),
            "import_statement" => Statement::Import(node),
            "import_from_statement" => Statement::FromImport(node),
            "future_import_statement" => Statement::FutureImport(node),
            _ => Statement::Other,
        }
    }
}

/// Parameters bucketed by kind, emitted positional, `*args`, keyword-only,
/// `**kwargs`.
#[derive(Default)]
struct ParameterPhases {
    positional: Vec<Parameter>,
    var_positional: Option<Parameter>,
    keyword_only: Vec<Parameter>,
    var_keyword: Option<Parameter>,
    /// Set once `*args` or a bare `*` has been seen.
    past_star: bool,
}

impl ParameterPhases {
    fn push_named(&mut self, param: Parameter) {
        if self.past_star {
            self.keyword_only.push(param);
        } else {
            self.positional.push(param);
        }
    }

    fn set_var_positional(&mut self, param: Parameter) {
        self.past_star = true;
        self.var_positional = Some(Parameter {
            is_variadic_positional: true,
            ..param
        });
    }

    fn set_var_keyword(&mut self, param: Parameter) {
        self.var_keyword = Some(Parameter {
            is_variadic_keyword: true,
            ..param
        });
    }

    fn into_vec(self) -> Vec<Parameter> {
        let mut params = self.positional;
        params.extend(self.var_positional);
        params.extend(self.keyword_only);
        params.extend(self.var_keyword);
        params
    }
}

pub struct PythonParser {
    language: tree_sitter::Language,
}

impl PythonParser {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn create_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Build a syntax tree, rejecting any source with parse errors.
    pub(crate) fn parse_tree(&self, source: &str, path: &str) -> Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(source, None).ok_or_else(|| Error::SyntaxInvalid {
            path: path.to_string(),
            line: 0,
        })?;

        let root = tree.root_node();
        if let Some(bad) = first_error(root).or_else(|| first_rejected(root, source.as_bytes())) {
            return Err(Error::SyntaxInvalid {
                path: path.to_string(),
                line: start_line(bad),
            });
        }

        Ok(ParsedFile {
            tree,
            source: source.as_bytes().to_vec(),
            path: path.to_string(),
        })
    }

    fn extract_function(&self, parsed: &ParsedFile, node: Node, decorators: Vec<String>) -> Function {
        let mut cursor = node.walk();
        let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");

        Function {
            name: field_text(parsed, node, "name").unwrap_or_default(),
            parameters: node
                .child_by_field_name("parameters")
                .map(|params| self.extract_parameters(parsed, params))
                .unwrap_or_default(),
            return_type: field_text(parsed, node, "return_type"),
            docstring: node
                .child_by_field_name("body")
                .and_then(|body| body_docstring(parsed, body)),
            decorators,
            is_async,
            line_number: start_line(node),
            end_line_number: end_line(node),
            complexity: None,
            source: parsed.segment(node),
        }
    }

    fn extract_class(&self, parsed: &ParsedFile, node: Node, decorators: Vec<String>) -> Class {
        let base_classes = node
            .child_by_field_name("superclasses")
            .map(|args| {
                let mut cursor = args.walk();
                let bases: Vec<String> = args
                    .named_children(&mut cursor)
                    .filter(|arg| {
                        !matches!(
                            arg.kind(),
                            "keyword_argument" | "dictionary_splat" | "comment"
                        )
                    })
                    .map(|arg| parsed.node_text(arg).to_string())
                    .collect();
                bases
            })
            .unwrap_or_default();

        let body = node.child_by_field_name("body");
        let mut methods = Vec::new();
        if let Some(body) = body {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                let (definition, decorators) = match Statement::classify(child) {
                    Statement::Function(def) => (def, Vec::new()),
                    Statement::Decorated(node) => match unwrap_decorated(parsed, node) {
                        Some(found) => found,
                        None => continue,
                    },
                    _ => continue,
                };
                if let Statement::Function(def) = Statement::classify(definition) {
                    methods.push(self.extract_function(parsed, def, decorators));
                }
            }
        }

        Class {
            name: field_text(parsed, node, "name").unwrap_or_default(),
            base_classes,
            methods,
            docstring: body.and_then(|b| body_docstring(parsed, b)),
            decorators,
            line_number: start_line(node),
            end_line_number: end_line(node),
            source: parsed.segment(node),
        }
    }

    fn extract_parameters(&self, parsed: &ParsedFile, params: Node) -> Vec<Parameter> {
        let mut phases = ParameterPhases::default();
        let mut cursor = params.walk();

        for child in params.children(&mut cursor) {
            match child.kind() {
                "identifier" => phases.push_named(Parameter::named(parsed.node_text(child))),
                "default_parameter" | "typed_default_parameter" => phases.push_named(Parameter {
                    name: field_text(parsed, child, "name").unwrap_or_default(),
                    type_hint: field_text(parsed, child, "type"),
                    default_value: field_text(parsed, child, "value"),
                    ..Parameter::default()
                }),
                "typed_parameter" => {
                    let type_hint = field_text(parsed, child, "type");
                    let mut inner = child.walk();
                    let target = child.named_children(&mut inner).next();
                    let Some(target) = target else { continue };
                    match target.kind() {
                        "list_splat_pattern" => phases.set_var_positional(Parameter {
                            name: splat_name(parsed, target),
                            type_hint,
                            ..Parameter::default()
                        }),
                        "dictionary_splat_pattern" => phases.set_var_keyword(Parameter {
                            name: splat_name(parsed, target),
                            type_hint,
                            ..Parameter::default()
                        }),
                        _ => phases.push_named(Parameter {
                            name: parsed.node_text(target).to_string(),
                            type_hint,
                            ..Parameter::default()
                        }),
                    }
                }
                "list_splat_pattern" => {
                    phases.set_var_positional(Parameter::named(splat_name(parsed, child)))
                }
                "dictionary_splat_pattern" => {
                    phases.set_var_keyword(Parameter::named(splat_name(parsed, child)))
                }
                // bare `*` separating keyword-only parameters
                "keyword_separator" | "*" => phases.past_star = true,
                _ => {}
            }
        }

        phases.into_vec()
    }

    fn extract_import(&self, parsed: &ParsedFile, node: Node) -> Vec<Import> {
        let line_number = start_line(node);
        let mut cursor = node.walk();
        let imports: Vec<Import> = node
            .children_by_field_name("name", &mut cursor)
            .filter_map(|name| match name.kind() {
                "dotted_name" => Some(Import {
                    module: parsed.node_text(name).to_string(),
                    line_number,
                    ..Import::default()
                }),
                "aliased_import" => Some(Import {
                    module: field_text(parsed, name, "name").unwrap_or_default(),
                    alias: field_text(parsed, name, "alias"),
                    line_number,
                    ..Import::default()
                }),
                _ => None,
            })
            .collect();
        imports
    }

    fn extract_from_import(&self, parsed: &ParsedFile, node: Node, module: String) -> Import {
        let mut cursor = node.walk();
        let mut names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .filter_map(|name| match name.kind() {
                "dotted_name" => Some(parsed.node_text(name).to_string()),
                "aliased_import" => field_text(parsed, name, "name"),
                _ => None,
            })
            .collect();

        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import")
        {
            names.push("*".to_string());
        }

        Import {
            module,
            names,
            alias: None,
            is_selective_import: true,
            line_number: start_line(node),
        }
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse_source(&self, source: &str, file_path: &str) -> Result<Module> {
        let parsed = self.parse_tree(source, file_path)?;
        let root = parsed.tree.root_node();

        let mut module = Module::new(file_path, Language::Python);
        module.docstring = body_docstring(&parsed, root);
        module.line_count = line_count(source);

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match Statement::classify(child) {
                Statement::Function(def) => {
                    module.functions.push(self.extract_function(&parsed, def, Vec::new()))
                }
                Statement::Class(def) => {
                    module.classes.push(self.extract_class(&parsed, def, Vec::new()))
                }
                Statement::Decorated(node) => {
                    let Some((definition, decorators)) = unwrap_decorated(&parsed, node) else {
                        continue;
                    };
                    match Statement::classify(definition) {
                        Statement::Function(def) => module
                            .functions
                            .push(self.extract_function(&parsed, def, decorators)),
                        Statement::Class(def) => module
                            .classes
                            .push(self.extract_class(&parsed, def, decorators)),
                        _ => {}
                    }
                }
                Statement::Import(node) => module.imports.extend(self.extract_import(&parsed, node)),
                Statement::FromImport(node) => {
                    let from = field_text(&parsed, node, "module_name").unwrap_or_default();
                    module.imports.push(self.extract_from_import(&parsed, node, from));
                }
                Statement::FutureImport(node) => {
                    module
                        .imports
                        .push(self.extract_from_import(&parsed, node, "__future__".to_string()));
                }
                Statement::Other => {}
            }
        }

        debug!(
            "parsed {}: {} functions, {} classes, {} imports",
            file_path,
            module.functions.len(),
            module.classes.len(),
            module.imports.len()
        );
        Ok(module)
    }
}

fn field_text(parsed: &ParsedFile, node: Node, field: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| parsed.node_text(child).to_string())
}

/// Name bound by `*args` / `**kwargs`.
fn splat_name(parsed: &ParsedFile, node: Node) -> String {
    parsed.node_text(node).trim_start_matches('*').trim().to_string()
}

/// Split a decorated definition into the definition and its decorator texts.
fn unwrap_decorated<'t>(parsed: &ParsedFile, node: Node<'t>) -> Option<(Node<'t>, Vec<String>)> {
    let definition = node.child_by_field_name("definition")?;
    let mut cursor = node.walk();
    let decorators = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .map(|d| decorator_text(parsed, d))
        .collect();
    Some((definition, decorators))
}

/// Docstring of a module or block: its first statement, when that is a bare
/// string literal or an implicit concatenation of plain literals.
fn body_docstring(parsed: &ParsedFile, body: Node) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }

    let mut inner = first.walk();
    let parts: Vec<Node> = first.named_children(&mut inner).collect();
    match parts.as_slice() {
        [literal] if literal.kind() == "string" => clean_docstring(parsed.node_text(*literal)),
        [joined] if joined.kind() == "concatenated_string" => {
            let mut cursor = joined.walk();
            let pieces: Vec<Node> = joined
                .named_children(&mut cursor)
                .filter(|p| !p.is_extra())
                .collect();
            if pieces.iter().any(|p| p.kind() != "string") {
                return None;
            }
            clean_concatenated_docstring(pieces.iter().map(|p| parsed.node_text(*p)))
        }
        _ => None,
    }
}

/// First node that tree-sitter accepts but the Python 3 grammar does not.
fn first_rejected<'t>(node: Node<'t>, source: &[u8]) -> Option<Node<'t>> {
    let rejected = match node.kind() {
        "print_statement" | "exec_statement" => Some(node),
        "parameters" | "lambda_parameters" => misordered_default(node),
        "module" | "block" => misaligned_statement(node, source),
        _ => None,
    };
    if rejected.is_some() {
        return rejected;
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| first_rejected(child, source))
}

/// A positional parameter without a default that follows one with a default.
fn misordered_default(params: Node) -> Option<Node> {
    let mut seen_default = false;
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        match child.kind() {
            "default_parameter" | "typed_default_parameter" => seen_default = true,
            "identifier" | "tuple_pattern" if seen_default => return Some(child),
            "typed_parameter" => {
                let mut inner = child.walk();
                let splat = child.named_children(&mut inner).next().is_some_and(|target| {
                    matches!(target.kind(), "list_splat_pattern" | "dictionary_splat_pattern")
                });
                if splat {
                    return None;
                }
                if seen_default {
                    return Some(child);
                }
            }
            // everything after these is keyword-only
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" | "*" => {
                return None
            }
            _ => {}
        }
    }
    None
}

/// A statement opening a line at a different column than its siblings.
/// Module-level statements must start at column 0.
fn misaligned_statement<'t>(container: Node<'t>, source: &[u8]) -> Option<Node<'t>> {
    let mut expected = (container.kind() == "module").then_some(0);
    let mut cursor = container.walk();
    for child in container.named_children(&mut cursor) {
        if child.is_extra() || !opens_line(child, source) {
            continue;
        }
        let column = child.start_position().column;
        match expected {
            Some(indent) if indent != column => return Some(child),
            Some(_) => {}
            None => expected = Some(column),
        }
    }
    None
}

/// Whether only whitespace precedes `node` on its first line.
fn opens_line(node: Node, source: &[u8]) -> bool {
    let start = node.start_byte();
    let line_start = start.saturating_sub(node.start_position().column);
    source
        .get(line_start..start)
        .is_some_and(|prefix| prefix.iter().all(|b| matches!(b, b' ' | b'\t' | b'\x0c')))
}
