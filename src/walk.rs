//! Module walk: package records into documentation and comment maps.
//!
//! Keys are qualified symbol names: the package import path, then the type
//! name and member name joined with `.` (`example.com/m/pkg.Client.Do`).
//! A later write to the same key overwrites the earlier one.

use std::collections::BTreeMap;
use std::path::Path;

use globset::GlobSet;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{LeechError, Result};
use crate::godoc::{FieldDoc, FuncDoc, PackageDoc, PackageReader, ReaderMode, TypeDoc, ValueDoc};
use crate::vfs::{self, Mount, Namespace, Resolved};

/// Virtual directory that import paths are resolved under.
pub const SRC_ROOT: &str = "/src";

/// Total and documented declarations of one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counter {
    pub total: usize,
    pub documented: usize,
}

impl Counter {
    /// Count one declaration.
    pub fn record(&mut self, documented: bool) {
        self.total += 1;
        if documented {
            self.documented += 1;
        }
    }

    /// Documented share in percent, `None` when nothing was counted.
    pub fn rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.documented as f64 / self.total as f64 * 100.0)
        }
    }
}

/// Counters for each declaration kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub types: Counter,
    pub funcs: Counter,
    pub values: Counter,
}

/// Options for a walk.
#[derive(Debug, Clone, Default)]
pub struct LeechOptions {
    pub mode: ReaderMode,
    /// Directories (relative to the module root) to skip.
    pub exclude: Option<GlobSet>,
    /// Pretty-print saved JSON.
    pub pretty: bool,
}

/// Collects documentation of a module tree.
pub struct Leech {
    ns: Namespace,
    reader: PackageReader,
    options: LeechOptions,
    docs: BTreeMap<String, String>,
    comments: BTreeMap<String, String>,
    coverage: Coverage,
}

impl Leech {
    /// Create a leech over a namespace.
    ///
    /// Fails when nothing in the namespace can serve `/src`.
    pub fn new(ns: Namespace, options: LeechOptions) -> Result<Self> {
        if !has_source_root(&ns) {
            return Err(LeechError::NoRoot(SRC_ROOT.to_string()));
        }
        let reader = PackageReader::new(options.mode)?;
        Ok(Self {
            ns,
            reader,
            options,
            docs: BTreeMap::new(),
            comments: BTreeMap::new(),
            coverage: Coverage::default(),
        })
    }

    pub fn docs(&self) -> &BTreeMap<String, String> {
        &self.docs
    }

    pub fn comments(&self) -> &BTreeMap<String, String> {
        &self.comments
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    /// Walk `module` and every package directory below it.
    pub fn walk(&mut self, module: &str) -> Result<()> {
        let module = module.trim_matches('/');
        let abs_path = vfs::join(SRC_ROOT, module);
        if !self.ns.is_dir(&abs_path) {
            return Err(LeechError::ModuleNotFound(module.to_string()));
        }

        self.visit(module, &abs_path);
        for rel in self.sub_dirs(&abs_path) {
            self.visit(&format!("{}/{}", module, rel), &vfs::join(&abs_path, &rel));
        }

        log::debug!(
            "{}: {} docs, {} comments",
            module,
            self.docs.len(),
            self.comments.len()
        );
        Ok(())
    }

    fn visit(&mut self, name: &str, dir: &str) {
        match self.reader.read_package(&self.ns, dir, name) {
            Ok(Some(pkg)) => self.package_doc(name, &pkg),
            Ok(None) => log::debug!("{}: no Go package", name),
            Err(e) => log::warn!("{}: {}", name, e),
        }
    }

    /// Package directories below `abs_path`, relative and slash-separated,
    /// in name order.
    fn sub_dirs(&self, abs_path: &str) -> Vec<String> {
        let Some(Resolved::Os(root)) = self.ns.resolve(abs_path) else {
            return Vec::new();
        };

        let mut dirs = Vec::new();
        let walker = WalkDir::new(&root)
            .follow_links(true)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if !e.file_type().is_dir() {
                    return false;
                }
                let name = e.file_name().to_string_lossy();
                // The go tool ignores these.
                if name.starts_with('.') || name.starts_with('_') || name == "testdata" {
                    return false;
                }
                let rel = relative(&root, e.path());
                if matches!(self.ns.resolve(&vfs::join(abs_path, &rel)), Some(Resolved::Hidden)) {
                    return false;
                }
                !self
                    .options
                    .exclude
                    .as_ref()
                    .is_some_and(|set| set.is_match(&rel))
            });

        for entry in walker {
            match entry {
                Ok(entry) => dirs.push(relative(&root, entry.path())),
                Err(e) => log::warn!("{}", e),
            }
        }
        dirs
    }

    /// Record a package under `name`.
    pub fn package_doc(&mut self, name: &str, pkg: &PackageDoc) {
        log::debug!("{}", name);
        let doc = pkg.doc.trim();
        if !doc.is_empty() {
            self.docs.insert(name.to_string(), doc.to_string());
        }

        for v in &pkg.consts {
            self.value_doc(name, v);
        }
        for v in &pkg.vars {
            self.value_doc(name, v);
        }
        for t in &pkg.types {
            self.type_doc(name, t);
        }
        for f in &pkg.funcs {
            self.func_doc(name, f);
        }
    }

    fn type_doc(&mut self, prefix: &str, t: &TypeDoc) {
        let type_name = format!("{}.{}", prefix, t.name);
        let doc = t.doc.trim();
        let has_doc = !doc.is_empty();
        if has_doc {
            self.docs.insert(type_name.clone(), doc.to_string());
        }

        for f in t.funcs.iter().chain(&t.methods) {
            self.func_doc(&type_name, f);
        }
        for field in &t.fields {
            self.field_doc(&type_name, field);
        }

        self.coverage.types.record(has_doc);
    }

    fn func_doc(&mut self, prefix: &str, f: &FuncDoc) {
        let doc = f.doc.trim();
        let has_doc = !doc.is_empty();
        if has_doc {
            self.docs.insert(format!("{}.{}", prefix, f.name), doc.to_string());
        }
        self.coverage.funcs.record(has_doc);
    }

    fn value_doc(&mut self, prefix: &str, v: &ValueDoc) {
        let mut has_doc = false;

        let group_doc = v.doc.trim();
        if !group_doc.is_empty() {
            for name in &v.names {
                self.docs.insert(format!("{}.{}", prefix, name), group_doc.to_string());
                has_doc = true;
            }
        }

        for spec in &v.specs {
            let doc = spec.doc.trim();
            let comment = spec.comment.trim();
            for name in &spec.names {
                let key = format!("{}.{}", prefix, name);
                if !doc.is_empty() {
                    self.docs.insert(key.clone(), doc.to_string());
                    has_doc = true;
                }
                if !comment.is_empty() {
                    self.comments.insert(key, comment.to_string());
                    has_doc = true;
                }
            }
        }

        self.coverage.values.record(has_doc);
    }

    /// Fields carry docs and comments but are not counted.
    fn field_doc(&mut self, prefix: &str, f: &FieldDoc) {
        let doc = f.doc.trim();
        let comment = f.comment.trim();
        for name in &f.names {
            let key = format!("{}.{}", prefix, name);
            if !doc.is_empty() {
                self.docs.insert(key.clone(), doc.to_string());
            }
            if !comment.is_empty() {
                self.comments.insert(key, comment.to_string());
            }
        }
    }

    /// Write the documentation map as a JSON object.
    pub fn save_docs(&self, path: &Path) -> Result<()> {
        write_map(path, &self.docs, self.options.pretty)
    }

    /// Write the comment map as a JSON object.
    pub fn save_comments(&self, path: &Path) -> Result<()> {
        write_map(path, &self.comments, self.options.pretty)
    }
}

fn write_map(path: &Path, map: &BTreeMap<String, String>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_vec_pretty(map)?
    } else {
        serde_json::to_vec(map)?
    };
    std::fs::write(path, json).map_err(|e| LeechError::io(path, e))
}

/// `/` bound to a tree with a `src` directory, or an existing directory
/// mounted at or below `/src`.
fn has_source_root(ns: &Namespace) -> bool {
    ns.mounts().any(|(point, mount)| match mount {
        Mount::Os(dir) if point == "/" => dir.join("src").is_dir(),
        Mount::Os(dir) => {
            (point == SRC_ROOT || point.starts_with("/src/")) && dir.is_dir()
        }
        Mount::Empty => false,
    })
}

fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
