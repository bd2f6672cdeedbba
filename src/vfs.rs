//! Virtual filesystem namespace.
//!
//! A `Namespace` maps slash-separated virtual paths onto OS directories via
//! bind mounts. The longest mount point that prefixes a path wins, so binding
//! a module checkout at `/src/example.com/mod` shadows whatever `/` (usually
//! GOROOT) has at that location. `Mount::Empty` hides a subtree entirely,
//! which is how vendor directories are kept out of the walk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{LeechError, Result};

/// What a mount point is backed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mount {
    /// An OS directory.
    Os(PathBuf),
    /// Nothing: the subtree looks empty.
    Empty,
}

/// Outcome of resolving a virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The path maps onto this OS path (which may or may not exist).
    Os(PathBuf),
    /// The path lies beneath an empty mount.
    Hidden,
}

/// A directory entry seen through the namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
}

/// Bind-mount namespace over the OS filesystem.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    mounts: BTreeMap<String, Mount>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `mount` at virtual path `at`, replacing any previous bind there.
    pub fn bind(&mut self, at: &str, mount: Mount) {
        let at = clean(at);
        log::debug!("bind {} -> {:?}", at, mount);
        self.mounts.insert(at, mount);
    }

    /// Number of mount points.
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Mount points in path order.
    pub fn mounts(&self) -> impl Iterator<Item = (&str, &Mount)> {
        self.mounts.iter().map(|(point, mount)| (point.as_str(), mount))
    }

    /// Resolve a virtual path through the longest matching mount point.
    pub fn resolve(&self, path: &str) -> Option<Resolved> {
        let path = clean(path);
        let (point, mount) = self
            .mounts
            .iter()
            .filter(|(point, _)| is_under(&path, point))
            .max_by_key(|(point, _)| point.len())?;

        match mount {
            Mount::Empty => Some(Resolved::Hidden),
            Mount::Os(root) => {
                let rest = path[point.len()..].trim_start_matches('/');
                let mut resolved = root.clone();
                for component in rest.split('/').filter(|c| !c.is_empty()) {
                    resolved.push(component);
                }
                Some(Resolved::Os(resolved))
            }
        }
    }

    /// Whether the virtual path is a visible directory.
    pub fn is_dir(&self, path: &str) -> bool {
        match self.resolve(path) {
            Some(Resolved::Os(p)) => p.is_dir(),
            _ => false,
        }
    }

    /// List a directory, omitting children hidden by empty mounts.
    ///
    /// Entries are sorted by name.
    pub fn read_dir(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = match self.resolve(path) {
            Some(Resolved::Os(p)) => p,
            Some(Resolved::Hidden) => return Ok(Vec::new()),
            None => {
                return Err(LeechError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no mount for path"),
                ))
            }
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| LeechError::io(&dir, e))? {
            let entry = entry.map_err(|e| LeechError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if matches!(self.resolve(&join(path, &name)), Some(Resolved::Hidden)) {
                continue;
            }
            // Follow symlinks the same way a plain stat would.
            let is_dir = entry.path().is_dir();
            entries.push(Entry { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Read a file through the namespace.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        match self.resolve(path) {
            Some(Resolved::Os(p)) => std::fs::read(&p).map_err(|e| LeechError::io(p, e)),
            _ => Err(LeechError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "path is not mounted"),
            )),
        }
    }
}

/// Join two virtual path fragments and clean the result.
pub fn join(base: &str, rel: &str) -> String {
    clean(&format!("{}/{}", base, rel))
}

/// Normalize a virtual path: leading slash, no trailing slash, no empty or
/// `.` components, `..` pops a component.
pub fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            c => parts.push(c),
        }
    }
    format!("/{}", parts.join("/"))
}

fn is_under(path: &str, point: &str) -> bool {
    point == "/"
        || path == point
        || (path.starts_with(point) && path.as_bytes().get(point.len()) == Some(&b'/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean() {
        assert_eq!(clean(""), "/");
        assert_eq!(clean("/"), "/");
        assert_eq!(clean("src/a/"), "/src/a");
        assert_eq!(clean("/src//a/./b/../c"), "/src/a/c");
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut ns = Namespace::new();
        ns.bind("/", Mount::Os(PathBuf::from("/goroot")));
        ns.bind("/src/example.com/mod", Mount::Os(PathBuf::from("/work/mod")));
        ns.bind("/src/example.com/mod/vendor", Mount::Empty);

        assert_eq!(
            ns.resolve("/src/fmt"),
            Some(Resolved::Os(PathBuf::from("/goroot/src/fmt")))
        );
        assert_eq!(
            ns.resolve("/src/example.com/mod/pkg"),
            Some(Resolved::Os(PathBuf::from("/work/mod/pkg")))
        );
        assert_eq!(
            ns.resolve("/src/example.com/mod/vendor/x"),
            Some(Resolved::Hidden)
        );
        // Prefix must end on a component boundary.
        assert_eq!(
            ns.resolve("/src/example.com/modx"),
            Some(Resolved::Os(PathBuf::from("/goroot/src/example.com/modx")))
        );
    }

    #[test]
    fn test_unmounted_path() {
        let mut ns = Namespace::new();
        ns.bind("/src/a", Mount::Os(PathBuf::from("/a")));
        assert_eq!(ns.resolve("/src/b"), None);
        assert!(ns.read_dir("/src/b").is_err());
    }

    #[test]
    fn test_rebind_replaces() {
        let mut ns = Namespace::new();
        ns.bind("/src/a", Mount::Os(PathBuf::from("/one")));
        ns.bind("/src/a/", Mount::Os(PathBuf::from("/two")));
        assert_eq!(ns.len(), 1);
        assert_eq!(ns.resolve("/src/a"), Some(Resolved::Os(PathBuf::from("/two"))));
    }

    #[test]
    fn test_read_dir_hides_empty_mounts() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("vendor")).unwrap();
        std::fs::create_dir(temp.path().join("pkg")).unwrap();
        std::fs::write(temp.path().join("a.go"), "package a\n").unwrap();

        let mut ns = Namespace::new();
        ns.bind("/src/m", Mount::Os(temp.path().to_path_buf()));
        ns.bind("/src/m/vendor", Mount::Empty);

        let entries = ns.read_dir("/src/m").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.go", "pkg"]);
        assert!(entries[1].is_dir);
        assert!(!entries[0].is_dir);

        assert!(ns.is_dir("/src/m/pkg"));
        assert!(!ns.is_dir("/src/m/vendor"));
        assert!(ns.read_dir("/src/m/vendor").unwrap().is_empty());
        assert_eq!(ns.read_file("/src/m/a.go").unwrap(), b"package a\n");
    }
}
