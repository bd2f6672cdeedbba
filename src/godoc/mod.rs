//! Go documentation extraction.
//!
//! Produces, per package directory, the same view of a package that Go's
//! documentation tooling presents: the package comment, value groups, types
//! with their constructors, methods and fields, and plain functions, each
//! carrying its doc comment and, where Go keeps one, its line comment.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐
//! │ Namespace    │────▶│ PackageReader  │────▶│ PackageDoc   │
//! │ (*.go files) │     │ (tree-sitter)  │     │ (types, funcs│
//! └──────────────┘     └────────────────┘     │  values)     │
//!                              │              └──────────────┘
//!                              ▼
//!                      ┌────────────────┐
//!                      │ CommentIndex   │
//!                      │ (doc / line    │
//!                      │  comments)     │
//!                      └────────────────┘
//! ```

mod build;
mod comments;
mod package;
mod reader;

pub use build::BuildContext;
pub use comments::{comment_text, CommentIndex};
pub use package::{
    is_exported, FieldDoc, FuncDoc, PackageDoc, TypeDoc, ValueDoc, ValueSpecDoc,
};
pub use reader::{PackageReader, ReaderMode};
