//! YAML configuration for codedoc.
//!
//! Every key is optional; a missing file or section falls back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::model::Language;

/// File names searched for in the working directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["codedoc.yaml", ".codedoc.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub complexity: ComplexityConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load an explicit config file, or discover one in `dir`.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::parse_file(path),
            None => match Self::discover(dir) {
                Some(path) => Self::parse_file(path),
                None => Ok(Self::default()),
            },
        }
    }

    /// First well-known config file present in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// Complexity analysis options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComplexityConfig {
    pub enabled: bool,
    pub thresholds: Thresholds,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thresholds: Thresholds::default(),
        }
    }
}

/// Inclusive upper bounds for the low/medium/high labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 5,
            medium: 10,
            high: 20,
        }
    }
}

/// Per-family parser options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    pub python: LanguageParserConfig,
    pub javascript: LanguageParserConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            python: LanguageParserConfig::with_extensions(&["py"]),
            javascript: LanguageParserConfig::with_extensions(&["js", "jsx", "ts", "tsx"]),
        }
    }
}

impl ParserConfig {
    /// Language to parse `path` as, or `None` when its extension is unknown,
    /// not listed, or its parser family is disabled.
    pub fn language_for(&self, path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?;
        let language = Language::from_extension(ext)?;
        let section = match language {
            Language::Python => &self.python,
            Language::JavaScript | Language::TypeScript => &self.javascript,
        };
        (section.enabled && section.accepts(ext)).then_some(language)
    }

    /// Exclusion globs of both parser families.
    ///
    /// Uses globset, so `**` matches across directories.
    pub fn exclusions(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in self
            .python
            .exclude_patterns
            .iter()
            .chain(&self.javascript.exclude_patterns)
        {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LanguageParserConfig {
    pub enabled: bool,
    /// Extensions without the dot. Empty accepts every extension of the
    /// language.
    pub extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for LanguageParserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl LanguageParserConfig {
    fn with_extensions(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            ..Self::default()
        }
    }

    fn accepts(&self, ext: &str) -> bool {
        self.extensions.is_empty()
            || self
                .extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// A `tracing` level or `EnvFilter` directive.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.complexity.enabled);
        assert_eq!(config.complexity.thresholds, Thresholds { low: 5, medium: 10, high: 20 });
        assert_eq!(config.parser.python.extensions, vec!["py"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
complexity:
  thresholds:
    low: 3
parser:
  javascript:
    enabled: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.complexity.thresholds.low, 3);
        assert_eq!(config.complexity.thresholds.medium, 10);
        assert!(config.complexity.enabled);
        assert!(!config.parser.javascript.enabled);
        assert!(config.parser.python.enabled);
    }

    #[test]
    fn test_language_for() {
        let mut parser = ParserConfig::default();
        assert_eq!(parser.language_for(Path::new("a.py")), Some(Language::Python));
        assert_eq!(parser.language_for(Path::new("a.tsx")), Some(Language::TypeScript));
        // known language, extension not listed
        assert_eq!(parser.language_for(Path::new("a.mjs")), None);
        assert_eq!(parser.language_for(Path::new("a.rs")), None);

        parser.python.enabled = false;
        assert_eq!(parser.language_for(Path::new("a.py")), None);
    }

    #[test]
    fn test_exclusions() {
        let mut parser = ParserConfig::default();
        parser.python.exclude_patterns = vec!["**/migrations/**".to_string()];
        let globs = parser.exclusions().unwrap();
        assert!(globs.is_match("app/migrations/0001_init.py"));
        assert!(!globs.is_match("app/models.py"));
    }

    #[test]
    fn test_load_discovers_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".codedoc.yaml"), "logging:\n  level: debug\n").unwrap();

        let config = Config::load(None, temp.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(None, temp.path()).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(&temp.path().join("nope.yaml")), temp.path()).is_err());
    }
}
