//! JavaScript and TypeScript structure parser using tree-sitter.
//!
//! Extraction is best-effort: error nodes are never inspected, so malformed
//! regions simply contribute nothing.

use std::path::Path;

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::error::Result;
use crate::model::{Class, Function, Import, Language, Module, Parameter};

use super::{
    clean_doc_comment, decorator_text, end_line, line_count, start_line, ParsedFile,
    StructureParser,
};

/// Grammar variant used for a script file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    JavaScript,
    TypeScript,
    /// TypeScript with JSX; produces the same node kinds as `TypeScript`.
    Tsx,
}

impl Dialect {
    /// `.ts`-family extensions select the typed dialect; anything else is
    /// JavaScript.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") => Dialect::Tsx,
            Some("ts" | "mts" | "cts") => Dialect::TypeScript,
            _ => Dialect::JavaScript,
        }
    }

    /// Language recorded on modules parsed with this dialect.
    pub fn language(&self) -> Language {
        match self {
            Dialect::JavaScript => Language::JavaScript,
            Dialect::TypeScript | Dialect::Tsx => Language::TypeScript,
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Program-level statements the parser acts on.
enum TopLevel<'t> {
    Function(Node<'t>),
    Class(Node<'t>),
    Bindings(Node<'t>),
    Import(Node<'t>),
    Export(Node<'t>),
    Other,
}

impl<'t> TopLevel<'t> {
    fn classify(node: Node<'t>) -> Self {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => TopLevel::Function(node),
            "class_declaration" | "abstract_class_declaration" => TopLevel::Class(node),
            "lexical_declaration" => TopLevel::Bindings(node),
            "import_statement" => TopLevel::Import(node),
            "export_statement" => TopLevel::Export(node),
            _ => TopLevel::Other,
        }
    }
}

/// Binding initializers that make a `const`/`let` a function.
fn is_function_value(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

pub struct JsParser {
    dialect: Dialect,
}

impl JsParser {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Parser with the dialect the file extension selects.
    pub fn for_path(path: &Path) -> Self {
        Self::new(Dialect::from_path(path))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn create_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.dialect.grammar())?;
        Ok(parser)
    }

    fn visit(&self, parsed: &ParsedFile, node: Node, anchor: Node, module: &mut Module) {
        match TopLevel::classify(node) {
            TopLevel::Function(def) => module
                .functions
                .push(self.extract_function(parsed, def, anchor)),
            TopLevel::Class(def) => module.classes.push(self.extract_class(parsed, def, anchor)),
            TopLevel::Bindings(decl) => module
                .functions
                .extend(self.extract_bindings(parsed, decl, anchor)),
            TopLevel::Import(stmt) => module.imports.extend(self.extract_import(parsed, stmt)),
            TopLevel::Export(stmt) => {
                if let Some(declaration) = stmt.child_by_field_name("declaration") {
                    self.visit(parsed, declaration, stmt, module);
                }
            }
            TopLevel::Other => {}
        }
    }

    fn extract_function(&self, parsed: &ParsedFile, node: Node, anchor: Node) -> Function {
        Function {
            name: field_text(parsed, node, "name").unwrap_or_default(),
            parameters: self.function_parameters(parsed, node),
            return_type: return_type(parsed, node),
            docstring: leading_doc(parsed, anchor),
            decorators: Vec::new(),
            is_async: has_keyword(node, "async"),
            line_number: start_line(node),
            end_line_number: end_line(node),
            complexity: None,
            source: parsed.segment(node),
        }
    }

    /// Functions bound by `const name = () => ...` style declarations.
    fn extract_bindings(&self, parsed: &ParsedFile, decl: Node, anchor: Node) -> Vec<Function> {
        let mut cursor = decl.walk();
        let functions: Vec<Function> = decl
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .filter_map(|declarator| {
                let name = declarator.child_by_field_name("name")?;
                let value = declarator.child_by_field_name("value")?;
                if name.kind() != "identifier" || !is_function_value(value.kind()) {
                    return None;
                }
                Some(Function {
                    name: parsed.node_text(name).to_string(),
                    parameters: self.function_parameters(parsed, value),
                    return_type: return_type(parsed, value),
                    docstring: leading_doc(parsed, anchor),
                    decorators: Vec::new(),
                    is_async: has_keyword(value, "async"),
                    line_number: start_line(decl),
                    end_line_number: end_line(value),
                    complexity: None,
                    source: parsed.segment(decl),
                })
            })
            .collect();
        functions
    }

    fn extract_class(&self, parsed: &ParsedFile, node: Node, anchor: Node) -> Class {
        let mut decorators = Vec::new();
        if anchor.id() != node.id() {
            decorators.extend(child_decorators(parsed, anchor));
        }
        decorators.extend(child_decorators(parsed, node));

        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut pending = Vec::new();
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                match member.kind() {
                    "decorator" => pending.push(decorator_text(parsed, member)),
                    "method_definition" => {
                        let decorators = std::mem::take(&mut pending);
                        methods.push(self.extract_method(parsed, member, decorators));
                    }
                    "comment" => {}
                    _ => pending.clear(),
                }
            }
        }

        Class {
            name: field_text(parsed, node, "name").unwrap_or_default(),
            base_classes: base_class(parsed, node).into_iter().collect(),
            methods,
            docstring: leading_doc(parsed, anchor),
            decorators,
            line_number: start_line(node),
            end_line_number: end_line(node),
            source: parsed.segment(node),
        }
    }

    fn extract_method(&self, parsed: &ParsedFile, node: Node, mut decorators: Vec<String>) -> Function {
        let mut markers = Vec::new();
        let mut is_async = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "decorator" => decorators.push(decorator_text(parsed, child)),
                "get" => markers.push("getter".to_string()),
                "set" => markers.push("setter".to_string()),
                "static" => markers.push("static".to_string()),
                "async" => is_async = true,
                _ => {}
            }
        }
        decorators.extend(markers);

        Function {
            name: field_text(parsed, node, "name").unwrap_or_default(),
            parameters: self.function_parameters(parsed, node),
            return_type: return_type(parsed, node),
            docstring: leading_doc(parsed, node),
            decorators,
            is_async,
            line_number: start_line(node),
            end_line_number: end_line(node),
            complexity: None,
            source: parsed.segment(node),
        }
    }

    /// Parameters of any function-like node, including the unparenthesized
    /// single parameter of an arrow function.
    fn function_parameters(&self, parsed: &ParsedFile, node: Node) -> Vec<Parameter> {
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            let extracted: Vec<Parameter> = params
                .named_children(&mut cursor)
                .filter_map(|p| self.extract_parameter(parsed, p))
                .collect();
            return extracted;
        }
        node.child_by_field_name("parameter")
            .map(|p| vec![Parameter::named(parsed.node_text(p))])
            .unwrap_or_default()
    }

    fn extract_parameter(&self, parsed: &ParsedFile, node: Node) -> Option<Parameter> {
        match node.kind() {
            "identifier" | "object_pattern" | "array_pattern" => {
                Some(Parameter::named(parsed.node_text(node)))
            }
            "assignment_pattern" => Some(Parameter {
                name: field_text(parsed, node, "left")?,
                default_value: field_text(parsed, node, "right"),
                ..Parameter::default()
            }),
            "rest_pattern" => Some(Parameter {
                name: rest_name(parsed, node),
                is_variadic_positional: true,
                ..Parameter::default()
            }),
            "required_parameter" | "optional_parameter" => {
                let type_hint = node
                    .child_by_field_name("type")
                    .map(|t| strip_annotation(parsed.node_text(t)));
                let pattern = match node.child_by_field_name("pattern") {
                    Some(pattern) => pattern,
                    None => {
                        let mut cursor = node.walk();
                        let first = node
                            .named_children(&mut cursor)
                            .find(|c| c.kind() == "identifier");
                        first?
                    }
                };
                if pattern.kind() == "rest_pattern" {
                    return Some(Parameter {
                        name: rest_name(parsed, pattern),
                        type_hint,
                        is_variadic_positional: true,
                        ..Parameter::default()
                    });
                }
                Some(Parameter {
                    name: parsed.node_text(pattern).to_string(),
                    type_hint,
                    default_value: field_text(parsed, node, "value"),
                    ..Parameter::default()
                })
            }
            _ => None,
        }
    }

    /// One record per import statement, always selective. Side-effect
    /// imports (`import "./polyfill"`) have no names.
    fn extract_import(&self, parsed: &ParsedFile, node: Node) -> Option<Import> {
        let source = node.child_by_field_name("source")?;
        let module = parsed
            .node_text(source)
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .to_string();

        let mut names = Vec::new();
        let mut alias = None;
        let mut cursor = node.walk();
        for clause in node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "import_clause")
        {
            let mut inner = clause.walk();
            for part in clause.named_children(&mut inner) {
                match part.kind() {
                    "identifier" => names.push(parsed.node_text(part).to_string()),
                    "named_imports" => {
                        let mut specs = part.walk();
                        names.extend(
                            part.named_children(&mut specs)
                                .filter(|s| s.kind() == "import_specifier")
                                .filter_map(|s| field_text(parsed, s, "name")),
                        );
                    }
                    "namespace_import" => {
                        let mut ids = part.walk();
                        let bound = part
                            .named_children(&mut ids)
                            .find(|c| c.kind() == "identifier")
                            .map(|id| parsed.node_text(id).to_string());
                        alias = bound;
                    }
                    _ => {}
                }
            }
        }

        Some(Import {
            module,
            names,
            alias,
            is_selective_import: true,
            line_number: start_line(node),
        })
    }
}

impl Default for JsParser {
    fn default() -> Self {
        Self::new(Dialect::JavaScript)
    }
}

impl StructureParser for JsParser {
    fn language(&self) -> Language {
        self.dialect.language()
    }

    fn parse_source(&self, source: &str, file_path: &str) -> Result<Module> {
        let mut parser = self.create_parser()?;
        let mut module = Module::new(file_path, self.dialect.language());
        module.line_count = line_count(source);

        let Some(tree) = parser.parse(source, None) else {
            return Ok(module);
        };
        let parsed = ParsedFile {
            tree,
            source: source.as_bytes().to_vec(),
            path: file_path.to_string(),
        };

        let root = parsed.tree.root_node();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            self.visit(&parsed, child, child, &mut module);
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

fn has_keyword(node: Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == keyword);
    found
}

fn child_decorators(parsed: &ParsedFile, node: Node) -> Vec<String> {
    let mut cursor = node.walk();
    let decorators = node
        .children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .map(|d| decorator_text(parsed, d))
        .collect();
    decorators
}

/// Type annotation text without the leading `:`.
fn strip_annotation(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix(':').unwrap_or(text).trim().to_string()
}

fn return_type(parsed: &ParsedFile, node: Node) -> Option<String> {
    node.child_by_field_name("return_type")
        .map(|t| strip_annotation(parsed.node_text(t)))
}

fn rest_name(parsed: &ParsedFile, node: Node) -> String {
    parsed
        .node_text(node)
        .trim_start_matches("...")
        .trim()
        .to_string()
}

/// The expression after `extends`. An `implements`-only heritage has none.
fn base_class(parsed: &ParsedFile, class: Node) -> Option<String> {
    let mut cursor = class.walk();
    let heritage = class
        .children(&mut cursor)
        .find(|c| c.kind() == "class_heritage")?;

    let mut inner = heritage.walk();
    let first = heritage.named_children(&mut inner).next()?;
    let clause = match first.kind() {
        "implements_clause" => return None,
        "extends_clause" => parsed.node_text(first),
        _ => parsed.node_text(heritage),
    };

    clause
        .trim()
        .strip_prefix("extends")
        .map(|base| base.trim().to_string())
        .filter(|base| !base.is_empty())
}

/// Doc comment immediately preceding `anchor`, skipping decorators.
fn leading_doc(parsed: &ParsedFile, anchor: Node) -> Option<String> {
    let mut prev = anchor.prev_named_sibling();
    while let Some(node) = prev.filter(|n| n.kind() == "decorator") {
        prev = node.prev_named_sibling();
    }

    let comment = prev.filter(|n| n.kind() == "comment")?;
    let text = parsed.node_text(comment);
    if !text.starts_with("/**") || text == "/**/" {
        return None;
    }
    let cleaned = clean_doc_comment(text);
    (!cleaned.is_empty()).then_some(cleaned)
}
