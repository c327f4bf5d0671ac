//! Output formatting for codedoc results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: the dictionary form of every module, for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::{ComplexityAnalyzer, FileComplexityReport, Rank};
use crate::model::{DependencyGraph, DictRepr, Function, Module};

// =============================================================================
// JSON Format
// =============================================================================

/// Result of a `parse` run.
#[derive(Serialize, Deserialize)]
pub struct JsonParseReport {
    pub version: String,
    pub path: String,
    pub files_parsed: usize,
    pub files_failed: usize,
    /// Dictionary form of each module.
    pub modules: Vec<Value>,
}

/// Result of a `complexity` run.
#[derive(Serialize, Deserialize)]
pub struct JsonComplexityReport {
    pub version: String,
    pub path: String,
    pub files: Vec<JsonFileComplexity>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonFileComplexity {
    pub file_path: String,
    pub total_functions: usize,
    pub average_complexity: f64,
    pub max_complexity: u32,
    pub most_complex_function: Option<String>,
    pub functions: Vec<JsonFunctionComplexity>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonFunctionComplexity {
    pub name: String,
    pub complexity: u32,
    pub rank: String,
    pub label: String,
    pub line_number: usize,
    pub end_line_number: usize,
}

pub fn parse_report(path: &str, modules: &[Module], failed: usize) -> JsonParseReport {
    JsonParseReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        files_parsed: modules.len(),
        files_failed: failed,
        modules: modules.iter().map(DictRepr::to_dict).collect(),
    }
}

pub fn complexity_report(
    path: &str,
    reports: &[FileComplexityReport],
    analyzer: &ComplexityAnalyzer,
) -> JsonComplexityReport {
    let files = reports
        .iter()
        .map(|report| JsonFileComplexity {
            file_path: report.file_path.clone(),
            total_functions: report.total_functions,
            average_complexity: report.average_complexity,
            max_complexity: report.max_complexity,
            most_complex_function: report.most_complex_function.clone(),
            functions: report
                .functions
                .iter()
                .map(|f| JsonFunctionComplexity {
                    name: f.name.clone(),
                    complexity: f.complexity,
                    rank: f.rank.to_string(),
                    label: analyzer.label_for(f.complexity).to_string(),
                    line_number: f.line_number,
                    end_line_number: f.end_line_number,
                })
                .collect(),
        })
        .collect();

    JsonComplexityReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        files,
    }
}

/// Write parsed modules in JSON format.
pub fn write_modules_json(path: &str, modules: &[Module], failed: usize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&parse_report(path, modules, failed))?;
    println!("{}", json);
    Ok(())
}

/// Write complexity reports in JSON format.
pub fn write_complexity_json(
    path: &str,
    reports: &[FileComplexityReport],
    analyzer: &ComplexityAnalyzer,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&complexity_report(path, reports, analyzer))?;
    println!("{}", json);
    Ok(())
}

/// Write a dependency graph in its dictionary form.
pub fn write_graph_json(graph: &DependencyGraph) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&graph.to_dict())?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header(path: &str) {
    println!();
    print!("  ");
    print!("{}", "codedoc".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    println!();
}

/// Write parsed modules in pretty (human-readable) format.
pub fn write_modules_pretty(path: &str, modules: &[Module], failed: usize) {
    write_header(path);

    for module in modules {
        write_module(module);
        println!();
    }

    write_parse_summary(modules, failed);
    println!();
}

fn write_module(module: &Module) {
    print!("  {}", module.file_path.blue().bold());
    println!(
        "  {}",
        format!("{} · {} lines", module.language, module.line_count).dimmed()
    );

    if let Some(doc) = &module.docstring {
        println!("    {}", first_line(doc).italic());
    }

    if !module.imports.is_empty() {
        let modules: Vec<&str> = module.imports.iter().map(|i| i.module.as_str()).collect();
        println!("    {} {}", "imports".dimmed(), modules.join(", "));
    }

    for func in &module.functions {
        print!("    {} ", "fn".green());
        write_function(func);
    }

    for class in &module.classes {
        print!("    {} {}", "class".yellow(), class.name.bold());
        if !class.base_classes.is_empty() {
            print!("({})", class.base_classes.join(", "));
        }
        println!("{}", format!("  :{}", class.line_number).dimmed());

        for method in &class.methods {
            print!("      {} ", "method".green());
            write_function(method);
        }
    }
}

fn write_function(func: &Function) {
    let params: Vec<String> = func
        .parameters
        .iter()
        .map(|p| {
            let prefix = if p.is_variadic_keyword {
                "**"
            } else if p.is_variadic_positional {
                "*"
            } else {
                ""
            };
            format!("{}{}", prefix, p.name)
        })
        .collect();

    if func.is_async {
        print!("{}", "async ".dimmed());
    }
    print!("{}({})", func.name.bold(), params.join(", "));
    if let Some(ret) = &func.return_type {
        print!(" -> {}", ret);
    }
    print!("{}", format!("  :{}", func.line_number).dimmed());
    if let Some(score) = func.complexity {
        print!("  ");
        write_colored_rank(Rank::for_score(score), score);
    }
    println!();
}

fn write_parse_summary(modules: &[Module], failed: usize) {
    let functions: usize = modules.iter().map(|m| m.callables().count()).sum();
    let classes: usize = modules.iter().map(|m| m.classes.len()).sum();

    if failed == 0 {
        print!("  {}", "✓".green());
    } else {
        print!("  {}", "✗".red());
    }
    print!(
        "  {} files, {} classes, {} functions",
        modules.len(),
        classes,
        functions
    );
    if failed > 0 {
        print!("  {}", format!("({} failed)", failed).red());
    }
    println!();
}

/// Write complexity reports in pretty format.
pub fn write_complexity_pretty(path: &str, reports: &[FileComplexityReport], analyzer: &ComplexityAnalyzer) {
    write_header(path);

    for report in reports {
        println!(
            "  {}  {}",
            report.file_path.blue().bold(),
            format!(
                "avg {:.2} · max {}",
                report.average_complexity, report.max_complexity
            )
            .dimmed()
        );

        for func in &report.functions {
            print!("    ");
            write_colored_rank(func.rank, func.complexity);
            print!("  {:<30}", func.name);
            print!("{}", format!(":{}", func.line_number).dimmed());
            println!("  {}", analyzer.label_for(func.complexity).to_string().dimmed());
        }
        println!();
    }
}

fn write_colored_rank(rank: Rank, score: u32) {
    let text = format!("{} ({})", rank, score);
    match rank {
        Rank::A => print!("{}", text.green().bold()),
        Rank::B => print!("{}", text.green()),
        Rank::C => print!("{}", text.yellow()),
        Rank::D => print!("{}", text.yellow().bold()),
        _ => print!("{}", text.red()),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
