//! Codedoc - source structure extraction for documentation generators.
//!
//! Codedoc reads Python, JavaScript and TypeScript files and produces a
//! language-neutral `Module` describing their functions, classes, imports
//! and docstrings, optionally annotated with cyclomatic complexity.
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for parsing:
//!
//! - `model`: Shared structure model and its dictionary form
//! - `parser`: Python and JS/TS structure parsers
//! - `analysis`: Cyclomatic complexity of Python functions
//! - `config`: YAML configuration
//! - `report`: Output formatting (pretty, JSON)
//!
//! # Failure behavior
//!
//! The Python parser is all-or-nothing: a file with any syntax error fails
//! with `Error::SyntaxInvalid`. The JS/TS parser is best-effort and never
//! reports syntax errors.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;

pub use analysis::{
    rank, ComplexityAnalyzer, ComplexityLabel, FileComplexityReport, FunctionComplexity, Rank,
};
pub use config::{ComplexityConfig, Config, Thresholds};
pub use error::{Error, Result};
pub use model::{Class, DependencyGraph, DictRepr, Function, Import, Language, Module, Parameter};
pub use parser::{parse_path, Dialect, JsParser, PythonParser, StructureParser};
