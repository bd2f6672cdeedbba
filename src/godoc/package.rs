//! Documentation records for one Go package.

use serde::Serialize;

/// Documentation of a package: what `go doc` would list for it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageDoc {
    /// Package name from the `package` clause.
    pub name: String,
    /// Import path the package was read under.
    pub import_path: String,
    /// Package comment (raw, untrimmed).
    pub doc: String,
    /// Files the package was built from, sorted.
    pub files: Vec<String>,
    pub consts: Vec<ValueDoc>,
    pub vars: Vec<ValueDoc>,
    /// Sorted by name.
    pub types: Vec<TypeDoc>,
    /// Package-level functions that are not constructors, sorted by name.
    pub funcs: Vec<FuncDoc>,
}

impl PackageDoc {
    /// Find a type by name.
    pub fn find_type(&self, name: &str) -> Option<&TypeDoc> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Find a package-level function by name.
    pub fn find_func(&self, name: &str) -> Option<&FuncDoc> {
        self.funcs.iter().find(|f| f.name == name)
    }
}

/// A `const` or `var` declaration. A parenthesized group is one value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValueDoc {
    /// Comment above the `const`/`var` keyword.
    pub doc: String,
    /// All names declared, in source order.
    pub names: Vec<String>,
    pub specs: Vec<ValueSpecDoc>,
}

/// One line (spec) of a value declaration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValueSpecDoc {
    pub names: Vec<String>,
    /// Leading comment of the spec (only inside a group).
    pub doc: String,
    /// Same-line trailing comment.
    pub comment: String,
}

/// A type declaration with its associated functions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeDoc {
    pub name: String,
    pub doc: String,
    /// Constructors: functions returning this type.
    pub funcs: Vec<FuncDoc>,
    pub methods: Vec<FuncDoc>,
    /// Struct fields or interface methods.
    pub fields: Vec<FieldDoc>,
}

/// A function or method.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FuncDoc {
    pub name: String,
    /// Receiver type as written (`T`, `*T`), methods only.
    pub recv: Option<String>,
    pub doc: String,
}

/// A struct field line or an interface method.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldDoc {
    pub names: Vec<String>,
    pub doc: String,
    pub comment: String,
}

/// Whether a Go identifier is exported.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Config"));
        assert!(is_exported("Ünicode"));
        assert!(!is_exported("config"));
        assert!(!is_exported("_"));
        assert!(!is_exported(""));
    }
}
