//! Cyclomatic complexity for Python source.
//!
//! Each function or method scores 1 plus one per decision point in its body.
//! Decision points inside a nested function are not counted toward the outer
//! function, and the nested definition itself is not a decision point. A
//! trailing `case _:` is the fall-through path, like `else`, and adds
//! nothing.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use streaming_iterator::StreamingIterator;
use tracing::{debug, warn};
use tree_sitter::{Language, Node, Query, QueryCursor};

use crate::config::{ComplexityConfig, Thresholds};
use crate::error::{Error, Result};
use crate::model::{self, Module};
use crate::parser::{end_line, read_source, start_line, ParsedFile, PythonParser};

const COMPLEXITY_QUERY: &str = r#"
(if_statement) @if
(elif_clause) @elif
(conditional_expression) @ternary
(for_statement) @for
(while_statement) @while
(for_statement alternative: (else_clause) @loop_else)
(while_statement alternative: (else_clause) @loop_else)
(try_statement (else_clause) @try_else)
(except_clause) @except
(boolean_operator) @bool_op
(with_statement) @with
(assert_statement) @assert
(for_in_clause) @comp_for
(if_clause) @comp_if
(case_clause) @case
"#;

/// Letter grade of a complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Rank {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Rank {
    /// Bucket a score: ≤5 A, ≤10 B, ≤20 C, ≤30 D, ≤40 E, otherwise F.
    pub fn for_score(score: u32) -> Self {
        match score {
            0..=5 => Rank::A,
            6..=10 => Rank::B,
            11..=20 => Rank::C,
            21..=30 => Rank::D,
            31..=40 => Rank::E,
            _ => Rank::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
            Rank::E => "E",
            Rank::F => "F",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorthand for [`Rank::for_score`].
pub fn rank(score: u32) -> Rank {
    Rank::for_score(score)
}

/// Human label for a score under configurable thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComplexityLabel {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "very high")]
    VeryHigh,
}

impl ComplexityLabel {
    pub fn for_score(score: u32, thresholds: &Thresholds) -> Self {
        if score <= thresholds.low {
            ComplexityLabel::Low
        } else if score <= thresholds.medium {
            ComplexityLabel::Medium
        } else if score <= thresholds.high {
            ComplexityLabel::High
        } else {
            ComplexityLabel::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLabel::Low => "low",
            ComplexityLabel::Medium => "medium",
            ComplexityLabel::High => "high",
            ComplexityLabel::VeryHigh => "very high",
        }
    }
}

impl fmt::Display for ComplexityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complexity of one function or method block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionComplexity {
    pub name: String,
    pub complexity: u32,
    pub rank: Rank,
    pub line_number: usize,
    pub end_line_number: usize,
}

/// Complexity of every block in one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileComplexityReport {
    pub file_path: String,
    /// Source order; class methods are flattened in.
    pub functions: Vec<FunctionComplexity>,
    pub total_functions: usize,
    pub average_complexity: f64,
    pub max_complexity: u32,
    /// First block with the maximum score.
    pub most_complex_function: Option<String>,
}

impl FileComplexityReport {
    pub fn new(file_path: impl Into<String>, functions: Vec<FunctionComplexity>) -> Self {
        let total: u32 = functions.iter().map(|f| f.complexity).sum();
        let average_complexity = if functions.is_empty() {
            0.0
        } else {
            f64::from(total) / functions.len() as f64
        };

        let mut most_complex: Option<&FunctionComplexity> = None;
        for func in &functions {
            if most_complex.map_or(true, |best| func.complexity > best.complexity) {
                most_complex = Some(func);
            }
        }

        Self {
            file_path: file_path.into(),
            total_functions: functions.len(),
            average_complexity,
            max_complexity: most_complex.map_or(0, |f| f.complexity),
            most_complex_function: most_complex.map(|f| f.name.clone()),
            functions,
        }
    }
}

pub struct ComplexityAnalyzer {
    config: ComplexityConfig,
    language: Language,
    parser: PythonParser,
}

impl ComplexityAnalyzer {
    pub fn new(config: ComplexityConfig) -> Self {
        Self {
            config,
            language: tree_sitter_python::LANGUAGE.into(),
            parser: PythonParser::new(),
        }
    }

    pub fn config(&self) -> &ComplexityConfig {
        &self.config
    }

    /// Score every function and method in `source`.
    pub fn analyze_source(&self, source: &str, file_path: &str) -> Result<FileComplexityReport> {
        let parsed = self
            .parser
            .parse_tree(source, file_path)
            .map_err(|e| match e {
                Error::SyntaxInvalid { path, line } => Error::ParseError { path, line },
                other => other,
            })?;
        let query = Query::new(&self.language, COMPLEXITY_QUERY)?;

        let mut blocks = Vec::new();
        collect_blocks(parsed.tree.root_node(), &mut blocks);

        let functions = blocks
            .into_iter()
            .map(|def| {
                let score = self.score(&query, &parsed, def);
                FunctionComplexity {
                    name: def
                        .child_by_field_name("name")
                        .map(|n| parsed.node_text(n).to_string())
                        .unwrap_or_default(),
                    complexity: score,
                    rank: Rank::for_score(score),
                    line_number: start_line(def),
                    end_line_number: end_line(def),
                }
            })
            .collect();

        let report = FileComplexityReport::new(file_path, functions);
        debug!(
            "analyzed {}: {} functions, max complexity {}",
            file_path, report.total_functions, report.max_complexity
        );
        Ok(report)
    }

    pub fn analyze_file(&self, path: &Path) -> Result<FileComplexityReport> {
        let source = read_source(path)?;
        self.analyze_source(&source, &path.to_string_lossy())
    }

    /// Set `complexity` on every function and method of `module` whose
    /// `(name, line_number)` matches a freshly computed block.
    ///
    /// A backing file that no longer exists leaves the module untouched.
    /// Non-Python modules are left untouched too.
    pub fn enrich_module(&self, module: &mut Module) -> Result<()> {
        if module.language != model::Language::Python {
            return Ok(());
        }

        let report = match self.analyze_file(Path::new(&module.file_path)) {
            Ok(report) => report,
            Err(Error::FileNotFound { path }) => {
                warn!("skipping complexity for {}: file no longer exists", path);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let scores: HashMap<(&str, usize), u32> = report
            .functions
            .iter()
            .map(|f| ((f.name.as_str(), f.line_number), f.complexity))
            .collect();

        for func in module.callables_mut() {
            if let Some(score) = scores.get(&(func.name.as_str(), func.line_number)).copied() {
                func.complexity = Some(score);
            }
        }
        Ok(())
    }

    pub fn label_for(&self, score: u32) -> ComplexityLabel {
        ComplexityLabel::for_score(score, &self.config.thresholds)
    }

    fn score(&self, query: &Query, parsed: &ParsedFile, def: Node) -> u32 {
        let Some(body) = def.child_by_field_name("body") else {
            return 1;
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, body, &parsed.source[..]);

        let mut score = 1;
        while let Some(m) = matches.next() {
            for capture in m.captures {
                if enclosing_function(capture.node.parent()).map(|f| f.id()) != Some(def.id()) {
                    continue;
                }
                let name = query.capture_names()[capture.index as usize];
                match name {
                    "case" if is_wildcard_case(parsed, capture.node) => {}
                    "if" | "elif" | "ternary" | "for" | "while" | "loop_else" | "try_else"
                    | "except" | "bool_op" | "with" | "assert" | "comp_for" | "comp_if"
                    | "case" => score += 1,
                    _ => {}
                }
            }
        }
        score
    }
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new(ComplexityConfig::default())
    }
}

/// Nearest `function_definition` at or above `node`.
fn enclosing_function(mut node: Option<Node>) -> Option<Node> {
    while let Some(current) = node {
        if current.kind() == "function_definition" {
            return Some(current);
        }
        node = current.parent();
    }
    None
}

/// Unguarded `case _:`.
fn is_wildcard_case(parsed: &ParsedFile, case: Node) -> bool {
    let mut cursor = case.walk();
    let mut patterns = Vec::new();
    for child in case.named_children(&mut cursor) {
        match child.kind() {
            "case_pattern" => patterns.push(child),
            "if_clause" => return false,
            _ => {}
        }
    }
    matches!(patterns.as_slice(), [only] if parsed.node_text(*only).trim() == "_")
}

/// Functions and methods of (possibly nested) classes, in source order.
///
/// Definitions under module-level or class-level compound statements
/// (`if`, `try`, `with`, loops) are found too. Function bodies are never
/// entered, so nested functions are not blocks.
fn collect_blocks<'t>(container: Node<'t>, blocks: &mut Vec<Node<'t>>) {
    let mut cursor = container.walk();
    for child in container.named_children(&mut cursor) {
        let definition = if child.kind() == "decorated_definition" {
            match child.child_by_field_name("definition") {
                Some(def) => def,
                None => continue,
            }
        } else {
            child
        };

        match definition.kind() {
            "function_definition" => blocks.push(definition),
            "class_definition" => {
                if let Some(body) = definition.child_by_field_name("body") {
                    collect_blocks(body, blocks);
                }
            }
            _ => collect_blocks(definition, blocks),
        }
    }
}
