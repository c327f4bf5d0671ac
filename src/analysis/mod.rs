//! Source analysis on top of parsed structure.
//!
//! Complexity is computed from a fresh parse of the file, independent of any
//! `Module` already built for it. `ComplexityAnalyzer::enrich_module` joins
//! the two by `(name, line_number)`.

mod complexity;

pub use complexity::{
    rank, ComplexityAnalyzer, ComplexityLabel, FileComplexityReport, FunctionComplexity, Rank,
};
