//! Error types for structure extraction and complexity analysis.

use thiserror::Error;

/// Errors raised by the parsers, the complexity analyzer and model
/// deserialization.
///
/// Every variant is fatal to the single call that produced it. Batch callers
/// decide whether to skip the file and continue.
#[derive(Error, Debug)]
pub enum Error {
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Python source that does not parse as Python 3.
    #[error("invalid syntax in {path} at line {line}")]
    SyntaxInvalid { path: String, line: usize },

    /// Complexity walk over Python source that does not parse.
    #[error("cannot compute complexity for {path}: parse error at line {line}")]
    ParseError { path: String, line: usize },

    #[error("unknown language: {0:?}")]
    UnknownLanguage(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    /// Dictionary form of the right shape but wrong types.
    #[error("cannot decode {entity}: {message}")]
    Decode {
        entity: &'static str,
        message: String,
    },

    #[error("unsupported language for extension: {extension:?}")]
    UnsupportedLanguage { extension: String },

    #[error("failed to load grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("invalid tree-sitter query: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the input itself was unparseable, as opposed
    /// to a missing file or a broken installation.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::SyntaxInvalid { .. } | Error::ParseError { .. })
    }
}

/// Result alias for codedoc operations.
pub type Result<T> = std::result::Result<T, Error>;
