//! Command-line interface for codedoc.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::{DirEntry, WalkDir};

use crate::analysis::{ComplexityAnalyzer, FileComplexityReport};
use crate::config::{Config, LoggingConfig};
use crate::model::{DependencyGraph, Language, Module};
use crate::parser::{Dialect, JsParser, PythonParser, StructureParser};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    "venv",
    ".venv",
    "dist",
    "build",
];

/// Extract documentation structure from Python, JavaScript and TypeScript
/// sources.
#[derive(Parser)]
#[command(name = "codedoc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (overrides RUST_LOG and the config file)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract functions, classes and imports
    Parse(ParseArgs),
    /// Report cyclomatic complexity of Python functions
    Complexity(ComplexityArgs),
    /// Print the import graph of every parsed module as JSON
    Graph(GraphArgs),
}

/// Arguments for the parse command.
#[derive(Parser)]
pub struct ParseArgs {
    /// Path to parse (file or directory)
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Skip complexity enrichment of Python modules
    #[arg(long)]
    pub no_complexity: bool,

    /// Force a script dialect instead of choosing by extension
    #[arg(long, value_enum)]
    pub dialect: Option<DialectArg>,
}

/// Arguments for the complexity command.
#[derive(Parser)]
pub struct ComplexityArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the graph command.
#[derive(Parser)]
pub struct GraphArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DialectArg {
    Javascript,
    Typescript,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Javascript => Dialect::JavaScript,
            DialectArg::Typescript => Dialect::TypeScript,
        }
    }
}

/// Load the `--config` file, or discover one in the working directory.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let cwd = std::env::current_dir()?;
    Config::load(explicit, &cwd)
}

/// Install the stderr log subscriber.
///
/// `--verbose` wins, then `RUST_LOG`, then `logging.level` from the config.
pub fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// Collect parseable files under `root` with the language each parses as.
fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<(PathBuf, Language)>> {
    let exclusions = config.parser.exclusions()?;
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclusions.is_match(relative) {
            debug!("excluded {}", relative.display());
            continue;
        }

        if let Some(language) = config.parser.language_for(path) {
            files.push((path.to_path_buf(), language));
        }
    }

    Ok(files)
}

/// Files to process for `path`: the file itself, or everything under a
/// directory.
fn resolve_targets(path: &Path, config: &Config) -> anyhow::Result<Vec<(PathBuf, Language)>> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("cannot access path {:?}: {}", path, e))?;

    if metadata.is_dir() {
        return collect_files(path, config);
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match Language::from_extension(ext) {
        Some(language) => Ok(vec![(path.to_path_buf(), language)]),
        None => anyhow::bail!("unsupported file type {:?}", path),
    }
}

fn validate_format(format: &str) -> bool {
    if format != "pretty" && format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            format
        );
        return false;
    }
    true
}

fn parse_one(path: &Path, language: Language, dialect: Option<DialectArg>) -> crate::Result<Module> {
    match language {
        Language::Python => PythonParser::new().parse_file(path),
        Language::JavaScript | Language::TypeScript => {
            let parser = match dialect {
                Some(d) => JsParser::new(d.into()),
                None => JsParser::for_path(path),
            };
            parser.parse_file(path)
        }
    }
}

/// Parse every target in parallel. Failed files are logged and counted.
fn parse_all(
    targets: &[(PathBuf, Language)],
    dialect: Option<DialectArg>,
    analyzer: Option<&ComplexityAnalyzer>,
) -> (Vec<Module>, usize) {
    let results: Vec<(&PathBuf, crate::Result<Module>)> = targets
        .par_iter()
        .map(|(path, language)| {
            let result = parse_one(path, *language, dialect).and_then(|mut module| {
                if let Some(analyzer) = analyzer {
                    analyzer.enrich_module(&mut module)?;
                }
                Ok(module)
            });
            (path, result)
        })
        .collect();

    let mut modules = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(module) => modules.push(module),
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }
    (modules, failed)
}

fn exit_code(succeeded: usize, failed: usize) -> i32 {
    if succeeded == 0 || failed > 0 {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    }
}

/// Run the parse command.
pub fn run_parse(args: &ParseArgs, config: &Config) -> anyhow::Result<i32> {
    if !validate_format(&args.format) {
        return Ok(EXIT_ERROR);
    }

    let targets = resolve_targets(&args.path, config)?;
    if targets.is_empty() {
        eprintln!("Warning: no files to parse");
        return Ok(EXIT_FAILED);
    }

    let analyzer = ComplexityAnalyzer::new(config.complexity);
    let enrich = config.complexity.enabled && !args.no_complexity;
    let (modules, failed) = parse_all(&targets, args.dialect, enrich.then_some(&analyzer));

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_modules_json(&path_str, &modules, failed)?,
        _ => report::write_modules_pretty(&path_str, &modules, failed),
    }

    Ok(exit_code(modules.len(), failed))
}

/// Run the complexity command.
pub fn run_complexity(args: &ComplexityArgs, config: &Config) -> anyhow::Result<i32> {
    if !validate_format(&args.format) {
        return Ok(EXIT_ERROR);
    }

    let targets: Vec<PathBuf> = resolve_targets(&args.path, config)?
        .into_iter()
        .filter(|(_, language)| *language == Language::Python)
        .map(|(path, _)| path)
        .collect();
    if targets.is_empty() {
        eprintln!("Warning: no Python files to analyze");
        return Ok(EXIT_FAILED);
    }

    let analyzer = ComplexityAnalyzer::new(config.complexity);
    let results: Vec<(&PathBuf, crate::Result<FileComplexityReport>)> = targets
        .par_iter()
        .map(|path| (path, analyzer.analyze_file(path)))
        .collect();

    let mut reports = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_complexity_json(&path_str, &reports, &analyzer)?,
        _ => report::write_complexity_pretty(&path_str, &reports, &analyzer),
    }

    Ok(exit_code(reports.len(), failed))
}

/// Run the graph command.
pub fn run_graph(args: &GraphArgs, config: &Config) -> anyhow::Result<i32> {
    let targets = resolve_targets(&args.path, config)?;
    if targets.is_empty() {
        eprintln!("Warning: no files to parse");
        return Ok(EXIT_FAILED);
    }

    let (modules, failed) = parse_all(&targets, None, None);
    let parsed = modules.len();

    let mut graph = DependencyGraph::new();
    for module in modules {
        graph.record_module(module);
    }
    report::write_graph_json(&graph)?;

    Ok(exit_code(parsed, failed))
}
