//! Go source generation.
//!
//! Embeds both maps into a Go file so a program can look up documentation
//! of another module at run time.

use std::collections::BTreeMap;
use std::fmt::Write;

/// Default package clause of the generated file.
pub const DEFAULT_PACKAGE: &str = "main";

/// Default generated file path.
pub const DEFAULT_OUTPUT: &str = "./leech_gen.go";

/// Render the generated Go file.
pub fn generate(
    package: &str,
    docs: &BTreeMap<String, String>,
    comments: &BTreeMap<String, String>,
) -> String {
    let mut out = String::new();
    out.push_str("// Code generated by leech. DO NOT EDIT.\n\n");
    let _ = writeln!(out, "package {}\n", package);
    write_map(&mut out, "LeechDocs", docs);
    out.push('\n');
    write_map(&mut out, "LeechComments", comments);
    out
}

fn write_map(out: &mut String, var: &str, map: &BTreeMap<String, String>) {
    let _ = writeln!(out, "var {} = map[string]string{{", var);
    for (key, value) in map {
        let _ = writeln!(out, "\t{}: {},", go_quote(key), go_quote(value));
    }
    out.push_str("}\n");
}

/// Quote a string as a Go interpreted string literal.
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `name` can be used as a package clause.
pub fn is_valid_package_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    name != "_" && chars.all(|c| c == '_' || c.is_alphanumeric())
}
