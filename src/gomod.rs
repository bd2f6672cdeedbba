//! Go module lookup.
//!
//! In module mode there is no GOPATH checkout to bind; the module lives
//! wherever its `go.mod` is. This reads just enough of `go.mod` to find the
//! module path and the Go version.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LeechError, Result};

/// A parsed `go.mod` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    /// Module path (e.g., "github.com/kataras/golog")
    pub path: String,
    /// Value of the `go` directive, if any
    pub go_version: Option<String>,
    /// Directory holding the go.mod file
    pub dir: PathBuf,
}

impl GoModule {
    /// Read `dir/go.mod`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let go_mod_path = dir.join("go.mod");
        let content = fs::read_to_string(&go_mod_path).map_err(|e| LeechError::io(&go_mod_path, e))?;
        Self::parse(&content, dir).map_err(|reason| LeechError::GoMod {
            path: go_mod_path,
            reason,
        })
    }

    /// Parse go.mod content.
    fn parse(content: &str, dir: &Path) -> std::result::Result<Self, String> {
        let mut path = None;
        let mut go_version = None;

        for line in content.lines() {
            // Strip trailing comments
            let line = line.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix("module") {
                if rest.starts_with(char::is_whitespace) || rest.starts_with('"') {
                    let value = rest.trim().trim_matches('"').trim_matches('`');
                    if !value.is_empty() {
                        path = Some(value.to_string());
                    }
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("go ") {
                go_version = Some(rest.trim().to_string());
            }
        }

        let path = path.ok_or_else(|| "no module directive".to_string())?;
        Ok(Self {
            path,
            go_version,
            dir: dir.to_path_buf(),
        })
    }

    /// Directory holding `import_path`, if it belongs to this module.
    pub fn dir_for(&self, import_path: &str) -> Option<PathBuf> {
        if import_path == self.path {
            return Some(self.dir.clone());
        }
        let rest = import_path.strip_prefix(&self.path)?.strip_prefix('/')?;
        let mut dir = self.dir.clone();
        for component in rest.split('/').filter(|c| !c.is_empty()) {
            dir.push(component);
        }
        Some(dir)
    }
}

/// Find the directory of `import_path` by walking up from each search root
/// looking for an enclosing go.mod that declares it (or a parent of it).
pub fn locate_module(import_path: &str, search_roots: &[PathBuf]) -> Option<PathBuf> {
    for root in search_roots {
        for dir in root.ancestors() {
            if !dir.join("go.mod").is_file() {
                continue;
            }
            match GoModule::from_dir(dir) {
                Ok(module) => {
                    if let Some(found) = module.dir_for(import_path) {
                        if found.is_dir() {
                            log::debug!(
                                "found {} via {} (go {})",
                                import_path,
                                dir.join("go.mod").display(),
                                module.go_version.as_deref().unwrap_or("unspecified")
                            );
                            return Some(found);
                        }
                    }
                }
                Err(e) => log::warn!("{}", e),
            }
            // The nearest go.mod owns this tree; stop at it.
            break;
        }
    }
    None
}
