//! Configuration file for leech.
//!
//! Everything here can also be set on the command line; flags win.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["leech.yaml", ".leech.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Where to write the documentation map (default: docs.json)
    #[serde(default)]
    pub docs_output: Option<PathBuf>,
    /// Where to write the comment map (default: comments.json)
    #[serde(default)]
    pub comments_output: Option<PathBuf>,
    /// Glob patterns, relative to the module root, of directories to skip
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Whether unexported identifiers count (default: false)
    #[serde(default)]
    pub include_unexported: Option<bool>,
    /// Pretty-print the JSON files (default: false)
    #[serde(default)]
    pub pretty: Option<bool>,
    #[serde(default)]
    pub codegen: Option<CodegenConfig>,
}

/// Go code generation settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CodegenConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Package clause of the generated file
    #[serde(default)]
    pub package: Option<String>,
    /// Generated file path
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Look for a default config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Compile `excluded_paths` into a matcher.
    pub fn exclusions(&self) -> anyhow::Result<Option<GlobSet>> {
        if self.excluded_paths.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
            builder.add(glob);
        }
        Ok(Some(builder.build()?))
    }

    /// Returns whether to include unexported identifiers (defaults to false).
    pub fn should_include_unexported(&self) -> bool {
        self.include_unexported.unwrap_or(false)
    }

    /// Returns whether code generation is enabled (defaults to false).
    pub fn codegen_enabled(&self) -> bool {
        self.codegen.as_ref().map(|c| c.enabled).unwrap_or(false)
    }
}
