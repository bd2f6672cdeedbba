//! Builds `PackageDoc` records from Go sources using tree-sitter.
//!
//! Reads every eligible file of a directory, keeps the declarations of the
//! dominant package, attaches methods to their receiver types and
//! constructors to the type they return, and drops unexported identifiers
//! unless asked not to.

use std::collections::{BTreeMap, HashSet};

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::build::BuildContext;
use super::comments::CommentIndex;
use super::package::{
    is_exported, FieldDoc, FuncDoc, PackageDoc, TypeDoc, ValueDoc, ValueSpecDoc,
};
use crate::error::{LeechError, Result};
use crate::vfs::{self, Namespace};

/// Tree-sitter query for the package clause.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

/// Filtering applied while reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderMode {
    /// Keep unexported identifiers too.
    pub include_unexported: bool,
}

/// A function as read from one file, before association.
#[derive(Debug, Clone)]
struct ParsedFunc {
    doc: FuncDoc,
    /// Base type name of the receiver (methods only).
    recv_base: Option<String>,
    /// Base type names of the results, one per result entry.
    result_types: Vec<String>,
    type_params: Vec<String>,
}

/// Declarations of one file.
#[derive(Debug, Clone, Default)]
struct FileDecls {
    file: String,
    package: String,
    doc: String,
    consts: Vec<ValueDoc>,
    vars: Vec<ValueDoc>,
    types: Vec<TypeDoc>,
    funcs: Vec<ParsedFunc>,
}

/// Reads Go packages into documentation records.
pub struct PackageReader {
    language: Language,
    package_query: Query,
    mode: ReaderMode,
    build: BuildContext,
}

impl PackageReader {
    /// Create a new reader.
    pub fn new(mode: ReaderMode) -> Result<Self> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        let package_query = Query::new(&language, PACKAGE_QUERY)?;
        Ok(Self {
            language,
            package_query,
            mode,
            build: BuildContext::host(),
        })
    }

    /// Select files for `build` instead of the host.
    pub fn with_build_context(mut self, build: BuildContext) -> Self {
        self.build = build;
        self
    }

    fn create_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Read the package in virtual directory `dir`.
    ///
    /// Returns `None` when the directory has no eligible Go files.
    pub fn read_package(
        &self,
        ns: &Namespace,
        dir: &str,
        import_path: &str,
    ) -> Result<Option<PackageDoc>> {
        let mut files = Vec::new();
        for entry in ns.read_dir(dir)? {
            if entry.is_dir || !is_go_source(&entry.name) {
                continue;
            }
            let source = ns.read_file(&vfs::join(dir, &entry.name))?;
            files.push((entry.name, source));
        }
        self.read_sources(import_path, files)
    }

    /// Build a package from in-memory `(file name, source)` pairs.
    pub fn read_sources(
        &self,
        import_path: &str,
        mut files: Vec<(String, Vec<u8>)>,
    ) -> Result<Option<PackageDoc>> {
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut parsed = Vec::with_capacity(files.len());
        for (name, source) in &files {
            if !self.build.includes(name, source) {
                log::debug!("{}: excluded for {}/{}", name, self.build.goos, self.build.goarch);
                continue;
            }
            match self.read_file(name, source) {
                Ok(decls) => parsed.push(decls),
                Err(e) => log::warn!("skipping {}/{}: {}", import_path, name, e),
            }
        }
        if parsed.is_empty() {
            return Ok(None);
        }

        let dir_name = import_path.rsplit('/').next().unwrap_or(import_path);
        let package = choose_package(&parsed, dir_name);
        parsed.retain(|f| f.package == package);

        Ok(Some(self.assemble(import_path, package, parsed)))
    }

    /// Merge per-file declarations and run association.
    fn assemble(&self, import_path: &str, package: String, files: Vec<FileDecls>) -> PackageDoc {
        let mut pkg = PackageDoc {
            name: package,
            import_path: import_path.to_string(),
            ..Default::default()
        };

        let mut types: BTreeMap<String, TypeDoc> = BTreeMap::new();
        let mut funcs = Vec::new();

        for file in files {
            pkg.files.push(file.file);
            if !file.doc.is_empty() {
                if !pkg.doc.is_empty() {
                    pkg.doc.push('\n');
                }
                pkg.doc.push_str(&file.doc);
            }
            pkg.consts.extend(file.consts);
            pkg.vars.extend(file.vars);
            for t in file.types {
                types.entry(t.name.clone()).or_insert(t);
            }
            funcs.extend(file.funcs);
        }

        for f in funcs {
            if let Some(base) = &f.recv_base {
                match types.get_mut(base) {
                    Some(t) => t.methods.push(f.doc),
                    None => log::debug!("dropping method {}.{}: receiver not visible", base, f.doc.name),
                }
                continue;
            }

            match constructed_type(&f, &types) {
                Some(name) => {
                    if let Some(t) = types.get_mut(&name) {
                        t.funcs.push(f.doc);
                    }
                }
                None => pkg.funcs.push(f.doc),
            }
        }

        for t in types.values_mut() {
            t.funcs.sort_by(|a, b| a.name.cmp(&b.name));
            t.methods.sort_by(|a, b| a.name.cmp(&b.name));
        }
        pkg.types = types.into_values().collect();
        pkg.funcs.sort_by(|a, b| a.name.cmp(&b.name));
        pkg
    }

    /// Parse one file and extract its declarations.
    fn read_file(&self, name: &str, source: &[u8]) -> Result<FileDecls> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| LeechError::Parse(name.to_string()))?;
        let root = tree.root_node();

        let package = self
            .extract_package(root, source)
            .ok_or_else(|| LeechError::Parse(format!("{}: missing package clause", name)))?;

        let index = CommentIndex::build(root, source);
        let mut decls = FileDecls {
            file: name.to_string(),
            package,
            ..Default::default()
        };

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "package_clause" => decls.doc = index.doc_for(node),
                "const_declaration" => {
                    if let Some(v) = self.value_decl(node, source, &index, "const_spec") {
                        decls.consts.push(v);
                    }
                }
                "var_declaration" => {
                    if let Some(v) = self.value_decl(node, source, &index, "var_spec") {
                        decls.vars.push(v);
                    }
                }
                "type_declaration" => decls.types.extend(self.type_decl(node, source, &index)),
                "function_declaration" | "method_declaration" => {
                    if let Some(f) = self.func_decl(node, source, &index) {
                        decls.funcs.push(f);
                    }
                }
                _ => {}
            }
        }

        Ok(decls)
    }

    /// Extract the package name from the tree.
    fn extract_package(&self, root: Node, source: &[u8]) -> Option<String> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.package_query, root, source);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = self.package_query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(node_text(capture.node, source).to_string());
                }
            }
        }
        None
    }

    fn visible(&self, name: &str) -> bool {
        name != "_" && (self.mode.include_unexported || is_exported(name))
    }

    /// A `const` or `var` declaration.
    fn value_decl(
        &self,
        decl: Node,
        source: &[u8],
        index: &CommentIndex,
        spec_kind: &str,
    ) -> Option<ValueDoc> {
        let grouped = is_grouped(decl);
        let mut value = ValueDoc {
            doc: index.doc_for(decl),
            ..Default::default()
        };

        for spec in specs(decl, &[spec_kind]) {
            let mut cursor = spec.walk();
            let names: Vec<String> = spec
                .children_by_field_name("name", &mut cursor)
                .map(|n| node_text(n, source).to_string())
                .filter(|n| self.visible(n))
                .collect();
            if names.is_empty() {
                continue;
            }
            value.names.extend(names.iter().cloned());
            value.specs.push(ValueSpecDoc {
                names,
                doc: if grouped { index.doc_for(spec) } else { String::new() },
                comment: index.line_comment_for(spec),
            });
        }

        if value.specs.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// A `type` declaration (possibly grouped).
    fn type_decl(&self, decl: Node, source: &[u8], index: &CommentIndex) -> Vec<TypeDoc> {
        let grouped = is_grouped(decl);
        let mut types = Vec::new();

        for spec in specs(decl, &["type_spec", "type_alias"]) {
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = node_text(name_node, source).to_string();
            if !self.visible(&name) {
                continue;
            }

            // A grouped spec without its own comment inherits the group's.
            let own = if grouped { index.doc_for(spec) } else { String::new() };
            let doc = if own.is_empty() { index.doc_for(decl) } else { own };
            let fields = match spec.child_by_field_name("type") {
                Some(ty) if spec.kind() == "type_spec" => self.fields(ty, source, index),
                _ => Vec::new(),
            };

            types.push(TypeDoc {
                name,
                doc,
                fields,
                ..Default::default()
            });
        }
        types
    }

    /// Struct fields or interface methods of a type expression.
    fn fields(&self, ty: Node, source: &[u8], index: &CommentIndex) -> Vec<FieldDoc> {
        let mut fields = Vec::new();
        let mut cursor = ty.walk();

        match ty.kind() {
            "struct_type" => {
                let lists: Vec<Node> = ty
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() == "field_declaration_list")
                    .collect();
                for list in lists {
                    let mut list_cursor = list.walk();
                    for field in list.named_children(&mut list_cursor) {
                        if field.kind() != "field_declaration" {
                            continue;
                        }
                        let mut name_cursor = field.walk();
                        // Embedded fields have no name.
                        let names: Vec<String> = field
                            .children_by_field_name("name", &mut name_cursor)
                            .map(|n| node_text(n, source).to_string())
                            .filter(|n| self.visible(n))
                            .collect();
                        if names.is_empty() {
                            continue;
                        }
                        fields.push(FieldDoc {
                            names,
                            doc: index.doc_for(field),
                            comment: index.line_comment_for(field),
                        });
                    }
                }
            }
            "interface_type" => {
                for elem in ty.named_children(&mut cursor) {
                    if !matches!(elem.kind(), "method_elem" | "method_spec") {
                        continue;
                    }
                    let Some(name_node) = elem.child_by_field_name("name") else {
                        continue;
                    };
                    let name = node_text(name_node, source).to_string();
                    if !self.visible(&name) {
                        continue;
                    }
                    fields.push(FieldDoc {
                        names: vec![name],
                        doc: index.doc_for(elem),
                        comment: index.line_comment_for(elem),
                    });
                }
            }
            _ => {}
        }

        fields
    }

    /// A function or method declaration.
    fn func_decl(&self, decl: Node, source: &[u8], index: &CommentIndex) -> Option<ParsedFunc> {
        let name = node_text(decl.child_by_field_name("name")?, source).to_string();
        if !self.visible(&name) {
            return None;
        }

        let (recv, recv_base) = match decl.child_by_field_name("receiver") {
            Some(params) => {
                let mut cursor = params.walk();
                let ty = params
                    .named_children(&mut cursor)
                    .find(|n| n.kind() == "parameter_declaration")
                    .and_then(|p| p.child_by_field_name("type"))?;
                (
                    Some(node_text(ty, source).to_string()),
                    Some(base_type_name(ty, source)?),
                )
            }
            None => (None, None),
        };

        let mut type_params = Vec::new();
        if let Some(tp) = decl.child_by_field_name("type_parameters") {
            let mut cursor = tp.walk();
            for param in tp.named_children(&mut cursor) {
                let mut name_cursor = param.walk();
                type_params.extend(
                    param
                        .children_by_field_name("name", &mut name_cursor)
                        .map(|n| node_text(n, source).to_string()),
                );
            }
        }

        let mut result_types = Vec::new();
        if let Some(result) = decl.child_by_field_name("result") {
            if result.kind() == "parameter_list" {
                let mut cursor = result.walk();
                for param in result.named_children(&mut cursor) {
                    if let Some(ty) = param.child_by_field_name("type") {
                        result_types.extend(factory_type_name(ty, source));
                    }
                }
            } else {
                result_types.extend(factory_type_name(result, source));
            }
        }

        Some(ParsedFunc {
            doc: FuncDoc {
                name,
                recv,
                doc: index.doc_for(decl),
            },
            recv_base,
            result_types,
            type_params,
        })
    }
}

/// `*.go`, not a test file, not ignored by the go tool (`.`/`_` prefix).
fn is_go_source(name: &str) -> bool {
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
}

/// Pick the package a directory stands for: the one named like the
/// directory, else the most frequent (ties go to the first alphabetically).
fn choose_package(files: &[FileDecls], dir_name: &str) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for f in files {
        *counts.entry(f.package.as_str()).or_default() += 1;
    }
    if counts.contains_key(dir_name) {
        return dir_name.to_string();
    }
    let mut best = ("", 0);
    for (name, count) in counts {
        if count > best.1 {
            best = (name, count);
        }
    }
    best.0.to_string()
}

/// The single package-local type a function constructs, if any.
fn constructed_type(f: &ParsedFunc, types: &BTreeMap<String, TypeDoc>) -> Option<String> {
    let type_params: HashSet<&str> = f.type_params.iter().map(String::as_str).collect();
    let mut found = None;
    let mut count = 0;
    for name in &f.result_types {
        if type_params.contains(name.as_str()) || !types.contains_key(name) {
            continue;
        }
        found = Some(name.clone());
        count += 1;
        if count > 1 {
            return None;
        }
    }
    found
}

/// Base name of a result type, looking through one slice level.
fn factory_type_name(ty: Node, source: &[u8]) -> Option<String> {
    let ty = if ty.kind() == "slice_type" {
        ty.child_by_field_name("element")?
    } else {
        ty
    };
    base_type_name(ty, source)
}

/// `T`, `*T`, `T[P]` and `*T[P]` all name `T`. Imported types yield `None`.
fn base_type_name(ty: Node, source: &[u8]) -> Option<String> {
    match ty.kind() {
        "type_identifier" => Some(node_text(ty, source).to_string()),
        "pointer_type" | "parenthesized_type" => base_type_name(ty.named_child(0)?, source),
        "generic_type" => base_type_name(ty.child_by_field_name("type")?, source),
        _ => None,
    }
}

/// Whether a declaration uses the parenthesized form.
fn is_grouped(decl: Node) -> bool {
    let mut cursor = decl.walk();
    let grouped = decl
        .children(&mut cursor)
        .any(|c| c.kind() == "(" || c.kind().ends_with("_spec_list"));
    grouped
}

/// Spec nodes of a declaration, looking inside `*_spec_list` wrappers.
fn specs<'a>(decl: Node<'a>, kinds: &[&str]) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            out.push(child);
        } else if child.kind().ends_with("_spec_list") {
            out.extend(specs(child, kinds));
        }
    }
    out
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
