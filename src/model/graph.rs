//! Passive import/call edge accumulator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dict::DictRepr;
use super::Module;

/// Modules keyed by file path plus import and call edge lists.
///
/// Edges are kept in insertion order and duplicates are allowed. Nothing
/// here resolves names or detects cycles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(default)]
    pub modules: BTreeMap<String, Module>,
    /// `(source file path, imported module name)`, stored as two-element
    /// lists.
    #[serde(default)]
    pub import_edges: Vec<(String, String)>,
    /// `(caller, callee)`
    #[serde(default)]
    pub call_edges: Vec<(String, String)>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. A module with the same path is replaced.
    pub fn add_module(&mut self, module: Module) {
        self.modules.insert(module.file_path.clone(), module);
    }

    /// Register a module and one import edge per import it declares.
    pub fn record_module(&mut self, module: Module) {
        for import in &module.imports {
            self.import_edges
                .push((module.file_path.clone(), import.module.clone()));
        }
        self.add_module(module);
    }

    pub fn add_import_edge(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.import_edges.push((source.into(), target.into()));
    }

    pub fn add_call_edge(&mut self, caller: impl Into<String>, callee: impl Into<String>) {
        self.call_edges.push((caller.into(), callee.into()));
    }

    /// Targets imported by `file_path`, in edge order.
    pub fn dependencies(&self, file_path: &str) -> Vec<&str> {
        self.import_edges
            .iter()
            .filter(|(source, _)| source == file_path)
            .map(|(_, target)| target.as_str())
            .collect()
    }

    /// Files that import `target`, in edge order.
    pub fn dependents(&self, target: &str) -> Vec<&str> {
        self.import_edges
            .iter()
            .filter(|(_, t)| t == target)
            .map(|(source, _)| source.as_str())
            .collect()
    }
}

impl DictRepr for DependencyGraph {
    const ENTITY: &'static str = "dependency graph";
}
