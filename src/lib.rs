//! Leech - documentation coverage for Go modules.
//!
//! Leech walks every package of a Go module, pulls the doc comment of each
//! exported declaration and the trailing comment of each field and value,
//! and reports how much of the module is documented. Results are written as
//! two flat JSON dictionaries keyed by qualified symbol name.
//!
//! # Architecture
//!
//! - `vfs`: bind-mount namespace (GOROOT, module checkout, hidden vendor)
//! - `gomod`: go.mod lookup for modules outside GOPATH
//! - `godoc`: tree-sitter based extraction of per-package documentation
//! - `walk`: the module walk, qualified names, counters and JSON maps
//! - `report`: coverage table (pretty, JSON)
//! - `codegen`: Go source embedding both maps
//! - `config`: optional YAML configuration

pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod godoc;
pub mod gomod;
pub mod report;
pub mod vfs;
pub mod walk;

pub use config::Config;
pub use error::{LeechError, Result};
pub use godoc::{PackageDoc, PackageReader, ReaderMode};
pub use vfs::{Mount, Namespace};
pub use walk::{Counter, Coverage, Leech, LeechOptions};
