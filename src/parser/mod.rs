//! Source structure extraction.
//!
//! Two parser families populate the shared model:
//! - `PythonParser`: all-or-nothing. Any syntax error fails the whole file.
//! - `JsParser`: best-effort over the JavaScript and TypeScript grammars.
//!   Malformed regions are skipped, never reported.
//!
//! Both walk tree-sitter trees and only look at the direct children of the
//! module root (and of class bodies), dispatching on a closed set of node
//! kinds per dialect.

mod docs;
mod javascript;
mod python;

use std::fs;
use std::io;
use std::path::Path;

use tree_sitter::Node;

use crate::error::{Error, Result};
use crate::model::{Language, Module};

pub use docs::{clean_concatenated_docstring, clean_doc_comment, clean_docstring};
pub use javascript::{Dialect, JsParser};
pub use python::PythonParser;

/// Holds a parsed tree-sitter tree and the source it was built from.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// Source bytes the tree was built from.
    pub source: Vec<u8>,
    /// The file path label (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Verbatim source of a node, or `None` when the bytes are not valid UTF-8.
    pub fn segment(&self, node: Node) -> Option<String> {
        node.utf8_text(&self.source).ok().map(str::to_string)
    }
}

/// Language-specific structure parser.
///
/// Parsers hold no mutable state; a fresh tree is built per call, so one
/// instance can serve many threads.
pub trait StructureParser: Send + Sync {
    /// The language recorded on produced modules.
    fn language(&self) -> Language;

    /// Parse a source string. `file_path` is only a label.
    fn parse_source(&self, source: &str, file_path: &str) -> Result<Module>;

    /// Read and parse a file.
    fn parse_file(&self, path: &Path) -> Result<Module> {
        let source = read_source(path)?;
        self.parse_source(&source, &path.to_string_lossy())
    }
}

/// Parse a file with the parser its extension selects.
pub fn parse_path(path: &Path) -> Result<Module> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match Language::from_extension(ext) {
        Some(Language::Python) => PythonParser::new().parse_file(path),
        Some(Language::JavaScript | Language::TypeScript) => JsParser::for_path(path).parse_file(path),
        None => Err(Error::UnsupportedLanguage {
            extension: ext.to_string(),
        }),
    }
}

/// Read a UTF-8 source file, mapping a missing path to `FileNotFound`.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.to_string_lossy().to_string(),
        },
        _ => Error::Io(e),
    })
}

/// 1-based first line of a node.
pub(crate) fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// 1-based last line of a node, inclusive.
///
/// A node that ends at column 0 ends on the previous line.
pub(crate) fn end_line(node: Node) -> usize {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row
    } else {
        end.row + 1
    }
}

/// Number of lines, counting a trailing line without newline.
pub(crate) fn line_count(source: &str) -> usize {
    source.lines().count()
}

/// First `ERROR` or `MISSING` node in document order.
pub(crate) fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found
}

/// Decorator expression text without the leading `@`.
pub(crate) fn decorator_text(parsed: &ParsedFile, decorator: Node) -> String {
    parsed
        .node_text(decorator)
        .trim_start_matches('@')
        .trim()
        .to_string()
}
