//! Shared structure model.
//!
//! Dialect-agnostic records produced by every parser: parameters, functions,
//! classes, imports and modules. Ownership is tree-shaped (a module owns its
//! functions and classes, a class owns its methods) so the dictionary form is
//! a plain recursive walk.
//!
//! The model does not know how it was populated. All per-language rules live
//! in `crate::parser`.

mod dict;
mod graph;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use dict::DictRepr;
pub use graph::DependencyGraph;

/// Languages a `Module` can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Stable tag used in the dictionary form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    /// Map a file extension (without dot) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            _ => None,
        }
    }

    /// Whether the language belongs to the JS/TS grammar family.
    pub fn is_script(&self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "python" => Ok(Language::Python),
            "javascript" => Ok(Language::JavaScript),
            "typescript" => Ok(Language::TypeScript),
            other => Err(Error::UnknownLanguage(other.to_string())),
        }
    }
}

/// A function or method parameter.
///
/// At most one of the two variadic flags is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Annotation source text, not parsed further.
    #[serde(default)]
    pub type_hint: Option<String>,
    /// Source text of the default expression.
    #[serde(default)]
    pub default_value: Option<String>,
    /// `*args` / `...rest`
    #[serde(default, alias = "is_args")]
    pub is_variadic_positional: bool,
    /// `**kwargs`
    #[serde(default, alias = "is_kwargs")]
    pub is_variadic_keyword: bool,
}

impl Parameter {
    /// A bare parameter with no annotation or default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.is_variadic_positional || self.is_variadic_keyword
    }
}

impl DictRepr for Parameter {
    const ENTITY: &'static str = "parameter";
}

/// A top-level function or a class method.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<String>,
    /// Cleaned of quoting and comment-delimiter noise.
    #[serde(default)]
    pub docstring: Option<String>,
    /// Decorator expressions without the leading `@`, or modifier markers
    /// such as `"getter"`, `"setter"` and `"static"` for script methods.
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub is_async: bool,
    /// 1-based, inclusive.
    #[serde(default)]
    pub line_number: usize,
    /// 1-based, inclusive.
    #[serde(default)]
    pub end_line_number: usize,
    /// Set by `ComplexityAnalyzer::enrich_module`.
    #[serde(default)]
    pub complexity: Option<u32>,
    /// Verbatim definition text.
    #[serde(default)]
    pub source: Option<String>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_decorator(&self, decorator: &str) -> bool {
        self.decorators.iter().any(|d| d == decorator)
    }
}

impl DictRepr for Function {
    const ENTITY: &'static str = "function";
}

/// A class declaration and the methods defined directly in its body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    #[serde(default)]
    pub base_classes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<Function>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub line_number: usize,
    #[serde(default)]
    pub end_line_number: usize,
    #[serde(default)]
    pub source: Option<String>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn method(&self, name: &str) -> Option<&Function> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl DictRepr for Class {
    const ENTITY: &'static str = "class";
}

/// One import record.
///
/// `import a, b` yields two records; `from x import a, b` yields one record
/// with `names = ["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Import {
    pub module: String,
    /// Empty for whole-module imports.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, alias = "is_from_import")]
    pub is_selective_import: bool,
    #[serde(default)]
    pub line_number: usize,
}

impl Import {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }
}

impl DictRepr for Import {
    const ENTITY: &'static str = "import";
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Module {
    pub file_path: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub docstring: Option<String>,
    /// Top-level definitions only. Nested functions are never promoted.
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub classes: Vec<Class>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub line_count: usize,
}

impl Module {
    pub fn new(file_path: impl Into<String>, language: Language) -> Self {
        Self {
            file_path: file_path.into(),
            language,
            ..Self::default()
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Top-level functions followed by every class method.
    pub fn callables(&self) -> impl Iterator<Item = &Function> {
        self.functions
            .iter()
            .chain(self.classes.iter().flat_map(|c| c.methods.iter()))
    }

    pub(crate) fn callables_mut(&mut self) -> impl Iterator<Item = &mut Function> {
        self.functions
            .iter_mut()
            .chain(self.classes.iter_mut().flat_map(|c| c.methods.iter_mut()))
    }
}

impl DictRepr for Module {
    const ENTITY: &'static str = "module";
}
