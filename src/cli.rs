//! Command-line interface for leech.

use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::codegen;
use crate::config::Config;
use crate::godoc::ReaderMode;
use crate::gomod;
use crate::report;
use crate::vfs::{self, Mount, Namespace};
use crate::walk::{Leech, LeechOptions, SRC_ROOT};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Default output file names.
pub const DEFAULT_DOCS_OUTPUT: &str = "docs.json";
pub const DEFAULT_COMMENTS_OUTPUT: &str = "comments.json";

/// Extract Go documentation comments and report documentation coverage.
///
/// Leech walks every package of a Go module, records each exported
/// declaration's doc comment and trailing line comment into two JSON
/// dictionaries keyed by qualified name, and prints the share of types,
/// functions and values that are documented.
#[derive(Parser)]
#[command(name = "leech")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Module to leech comments from (import path, e.g. github.com/kataras/golog)
    #[arg(short, long)]
    pub module: Option<String>,

    /// Verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// GOPATH list to search for the module (default: $HOME/go)
    #[arg(long, env = "GOPATH")]
    pub gopath: Option<OsString>,

    /// GOROOT to bind at the namespace root (default: `go env GOROOT`)
    #[arg(long, env = "GOROOT")]
    pub goroot: Option<PathBuf>,

    /// Directory to start module-mode lookup from (default: current directory)
    #[arg(short = 'C', long)]
    pub dir: Option<PathBuf>,

    /// Documentation map output file
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Comment map output file
    #[arg(long)]
    pub comments: Option<PathBuf>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Include unexported identifiers
    #[arg(long)]
    pub all: bool,

    /// Generate Go code embedding both maps
    #[arg(long)]
    pub codegen: bool,

    /// Package name to use in the generated code (default: main)
    #[arg(long)]
    pub pkg: Option<String>,

    /// Name of the generated Go file (default: ./leech_gen.go)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Initialize logging. `-v` enables debug output; `RUST_LOG` overrides.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();
}

/// Run leech with parsed arguments.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let module = match cli.module.as_deref().map(|m| m.trim_matches('/')) {
        Some(m) if !m.is_empty() => m,
        _ => {
            Cli::command().print_help()?;
            return Ok(EXIT_SUCCESS);
        }
    };

    // Validate format
    if cli.format != "pretty" && cli.format != "json" {
        log::error!("invalid format {:?}, must be 'pretty' or 'json'", cli.format);
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(cli) {
        Ok(c) => c,
        Err(e) => {
            log::error!("config: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let exclude = match config.exclusions() {
        Ok(set) => set,
        Err(e) => {
            log::error!("config: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let ns = build_namespace(cli, module);
    let options = LeechOptions {
        mode: ReaderMode {
            include_unexported: cli.all || config.should_include_unexported(),
        },
        exclude,
        pretty: config.pretty.unwrap_or(false),
    };

    let mut leech = match Leech::new(ns, options) {
        Ok(l) => l,
        Err(e) => return Ok(fatal(&e)),
    };
    if let Err(e) = leech.walk(module) {
        return Ok(fatal(&e));
    }

    // Persisting is best-effort.
    let docs_path = output_path(&cli.docs, &config.docs_output, DEFAULT_DOCS_OUTPUT);
    if let Err(e) = leech.save_docs(&docs_path) {
        log::warn!("{}", e);
    }
    let comments_path = output_path(&cli.comments, &config.comments_output, DEFAULT_COMMENTS_OUTPUT);
    if let Err(e) = leech.save_comments(&comments_path) {
        log::warn!("{}", e);
    }

    if cli.codegen || config.codegen_enabled() {
        write_codegen(cli, &config, &leech);
    }

    let coverage = leech.coverage();
    match cli.format.as_str() {
        "json" => report::write_json(module, &coverage, leech.docs().len(), leech.comments().len())?,
        _ => report::write_pretty(&coverage),
    }

    Ok(EXIT_SUCCESS)
}

fn fatal(e: &dyn std::error::Error) -> i32 {
    log::error!("{}", e);
    EXIT_ERROR
}

/// Explicit `--config`, else a default file in the current directory.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = match &cli.config {
        Some(p) => p.clone(),
        None => match Config::discover(Path::new(".")) {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };
    log::debug!("config {}", path.display());
    Config::parse_file(&path)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}

fn output_path(flag: &Option<PathBuf>, configured: &Option<PathBuf>, default: &str) -> PathBuf {
    flag.clone()
        .or_else(|| configured.clone())
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Bind GOROOT at `/`, then the module checkout over `/src/<module>` with its
/// vendor directory hidden. The checkout comes from the first GOPATH entry
/// that has it, else from the go.mod enclosing `--dir`.
pub fn build_namespace(cli: &Cli, module: &str) -> Namespace {
    let mut ns = Namespace::new();
    if let Some(goroot) = goroot(cli) {
        ns.bind("/", Mount::Os(goroot));
    }

    let from_gopath = gopath_entries(cli.gopath.as_ref())
        .into_iter()
        .map(|p| module_dir(&p.join("src"), module))
        .find(|mp| mp.is_dir());

    let found = from_gopath.or_else(|| {
        let start = cli
            .dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .map(|d| d.canonicalize().unwrap_or(d));
        start.and_then(|d| gomod::locate_module(module, &[d]))
    });

    match found {
        Some(dir) => {
            log::debug!("module {} at {}", module, dir.display());
            let at = vfs::join(SRC_ROOT, module);
            ns.bind(&at, Mount::Os(dir));
            ns.bind(&vfs::join(&at, "vendor"), Mount::Empty);
        }
        None => log::debug!("module {} not in GOPATH or a go.mod; relying on GOROOT", module),
    }
    ns
}

/// `--goroot` or `$GOROOT`, else the root of the installed go tool.
fn goroot(cli: &Cli) -> Option<PathBuf> {
    cli.goroot.clone().or_else(go_env_goroot)
}

fn go_env_goroot() -> Option<PathBuf> {
    let output = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if dir.is_empty() {
        return None;
    }
    log::debug!("GOROOT {} from go env", dir);
    Some(PathBuf::from(dir))
}

/// GOPATH entries, defaulting to `$HOME/go`.
fn gopath_entries(gopath: Option<&OsString>) -> Vec<PathBuf> {
    match gopath {
        Some(list) if !list.is_empty() => std::env::split_paths(list)
            .filter(|p| !p.as_os_str().is_empty())
            .collect(),
        _ => std::env::var_os("HOME")
            .map(|home| vec![PathBuf::from(home).join("go")])
            .unwrap_or_default(),
    }
}

fn module_dir(root: &Path, module: &str) -> PathBuf {
    let mut dir = root.to_path_buf();
    for component in module.split('/').filter(|c| !c.is_empty()) {
        dir.push(component);
    }
    dir
}

/// Write the generated Go file; failures are logged.
fn write_codegen(cli: &Cli, config: &Config, leech: &Leech) {
    let settings = config.codegen.clone().unwrap_or_default();
    let package = cli
        .pkg
        .clone()
        .or(settings.package)
        .unwrap_or_else(|| codegen::DEFAULT_PACKAGE.to_string());
    if !codegen::is_valid_package_name(&package) {
        log::warn!("skipping code generation: invalid package name {:?}", package);
        return;
    }
    let output = output_path(&cli.output, &settings.output, codegen::DEFAULT_OUTPUT);

    let source = codegen::generate(&package, leech.docs(), leech.comments());
    match std::fs::write(&output, source) {
        Ok(()) => log::info!("wrote {}", output.display()),
        Err(e) => log::warn!("failed to write {}: {}", output.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::Resolved;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["leech"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_flags() {
        let cli = cli(&["-m", "github.com/kataras/golog", "-v", "--codegen", "--pkg", "docs"]);
        assert_eq!(cli.module.as_deref(), Some("github.com/kataras/golog"));
        assert!(cli.verbose);
        assert!(cli.codegen);
        assert_eq!(cli.pkg.as_deref(), Some("docs"));
        assert_eq!(cli.format, "pretty");
    }

    #[test]
    fn test_missing_module_prints_usage() {
        let cli = cli(&[]);
        assert_eq!(run(&cli).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn test_invalid_format() {
        let cli = cli(&["-m", "example.com/m", "-f", "xml"]);
        assert_eq!(run(&cli).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_gopath_entries() {
        let list = std::env::join_paths(["/a", "/b"]).unwrap();
        assert_eq!(
            gopath_entries(Some(&list)),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_output_path_precedence() {
        let flag = Some(PathBuf::from("flag.json"));
        let configured = Some(PathBuf::from("config.json"));
        assert_eq!(output_path(&flag, &configured, "d.json"), PathBuf::from("flag.json"));
        assert_eq!(output_path(&None, &configured, "d.json"), PathBuf::from("config.json"));
        assert_eq!(output_path(&None, &None, "d.json"), PathBuf::from("d.json"));
    }

    #[test]
    fn test_build_namespace_from_gopath() {
        let gopath = TempDir::new().unwrap();
        let checkout = gopath.path().join("src/example.com/m");
        std::fs::create_dir_all(checkout.join("vendor")).unwrap();

        let mut cli = cli(&["-m", "example.com/m"]);
        cli.gopath = Some(gopath.path().as_os_str().to_os_string());
        cli.goroot = None;

        let ns = build_namespace(&cli, "example.com/m");
        assert_eq!(
            ns.resolve("/src/example.com/m/pkg"),
            Some(Resolved::Os(checkout.join("pkg")))
        );
        assert_eq!(ns.resolve("/src/example.com/m/vendor"), Some(Resolved::Hidden));
    }

    #[test]
    fn test_goroot_flag_wins() {
        let cli = cli(&["-m", "fmt", "--goroot", "/opt/go"]);
        assert_eq!(goroot(&cli), Some(PathBuf::from("/opt/go")));

        let ns = build_namespace(&cli, "fmt");
        assert_eq!(
            ns.resolve("/src/fmt"),
            Some(Resolved::Os(PathBuf::from("/opt/go/src/fmt")))
        );
    }

    fn copy_tree(from: &Path, to: &Path) {
        for entry in walkdir::WalkDir::new(from) {
            let entry = entry.unwrap();
            let target = to.join(entry.path().strip_prefix(from).unwrap());
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target).unwrap();
            } else {
                std::fs::copy(entry.path(), &target).unwrap();
            }
        }
    }

    /// A GOPATH holding the fixture module, plus an output directory.
    fn fixture_gopath() -> (TempDir, TempDir) {
        let gopath = TempDir::new().unwrap();
        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/fixture");
        copy_tree(&fixture, &gopath.path().join("src/example.com/fixture"));
        (gopath, TempDir::new().unwrap())
    }

    fn fixture_cli(gopath: &TempDir, docs: &Path, comments: &Path) -> Cli {
        let mut cli = cli(&["-m", "example.com/fixture", "-f", "json"]);
        cli.gopath = Some(gopath.path().as_os_str().to_os_string());
        cli.docs = Some(docs.to_path_buf());
        cli.comments = Some(comments.to_path_buf());
        cli
    }

    #[test]
    fn test_run_writes_both_maps() {
        let (gopath, out) = fixture_gopath();
        let docs = out.path().join("docs.json");
        let comments = out.path().join("comments.json");

        let code = run(&fixture_cli(&gopath, &docs, &comments)).unwrap();
        assert_eq!(code, EXIT_SUCCESS);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&docs).unwrap()).unwrap();
        assert_eq!(written["example.com/fixture.Version"], "Version is the fixture version.");
        assert!(written.get("example.com/fixture/vendor/dep.Dep").is_none());

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&comments).unwrap()).unwrap();
        assert_eq!(written["example.com/fixture.Version"], "semver");
    }

    #[test]
    fn test_run_unwritable_output_still_succeeds() {
        let (gopath, out) = fixture_gopath();
        let docs = out.path().join("missing/dir/docs.json");
        let comments = out.path().join("comments.json");

        let code = run(&fixture_cli(&gopath, &docs, &comments)).unwrap();
        assert_eq!(code, EXIT_SUCCESS);
        assert!(!docs.exists());
        assert!(comments.exists());
    }

    #[test]
    fn test_run_unknown_module_fails() {
        let (gopath, out) = fixture_gopath();
        let mut cli = fixture_cli(&gopath, &out.path().join("d.json"), &out.path().join("c.json"));
        cli.module = Some("example.com/nowhere".to_string());
        cli.dir = Some(out.path().to_path_buf());
        // A GOROOT with a src tree but without the module.
        std::fs::create_dir_all(out.path().join("goroot/src")).unwrap();
        cli.goroot = Some(out.path().join("goroot"));

        assert_eq!(run(&cli).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_build_namespace_from_go_mod() {
        let empty_gopath = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        std::fs::write(work.path().join("go.mod"), "module example.com/mm\n").unwrap();

        let mut cli = cli(&["-m", "example.com/mm"]);
        cli.gopath = Some(empty_gopath.path().as_os_str().to_os_string());
        cli.goroot = None;
        cli.dir = Some(work.path().to_path_buf());

        let ns = build_namespace(&cli, "example.com/mm");
        assert!(ns.is_dir("/src/example.com/mm"));
    }
}
