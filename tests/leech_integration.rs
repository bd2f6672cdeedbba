//! Integration tests for the module walk.
//!
//! These tests run a full walk over the Go module in testdata/fixture and
//! check the resulting maps and counters against hand-counted values.

use std::collections::BTreeMap;
use std::path::PathBuf;

use globset::{Glob, GlobSetBuilder};
use leech::codegen;
use leech::godoc::ReaderMode;
use leech::vfs::{Mount, Namespace};
use leech::walk::{Counter, Leech, LeechOptions};
use tempfile::TempDir;

const MODULE: &str = "example.com/fixture";

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/fixture")
}

fn namespace() -> Namespace {
    let mut ns = Namespace::new();
    ns.bind("/src/example.com/fixture", Mount::Os(fixture_path()));
    ns.bind("/src/example.com/fixture/vendor", Mount::Empty);
    ns
}

/// Walk the fixture module with the given options.
fn run_walk(options: LeechOptions) -> Leech {
    let mut leech = Leech::new(namespace(), options).expect("should create leech");
    leech.walk(MODULE).expect("walk should succeed");
    leech
}

fn key(suffix: &str) -> String {
    format!("{}{}", MODULE, suffix)
}

#[test]
fn test_coverage_counts() {
    let leech = run_walk(LeechOptions::default());
    let coverage = leech.coverage();

    // Client, Options, Memory, Store documented; Mode is not.
    assert_eq!(coverage.types, Counter { total: 5, documented: 4 });
    // Undocumented: Client.Close, Mode.String, Helper, Memory.Put.
    assert_eq!(coverage.funcs, Counter { total: 11, documented: 7 });
    // Version, the level group, DefaultTTL and Max documented; ErrClosed is not.
    assert_eq!(coverage.values, Counter { total: 5, documented: 4 });

    assert_eq!(coverage.types.rate(), Some(80.0));
    assert_eq!(coverage.values.rate(), Some(80.0));
    let funcs = coverage.funcs.rate().expect("funcs were counted");
    assert!((funcs - 63.64).abs() < 0.01, "func rate was {}", funcs);
}

#[test]
fn test_docs_map() {
    let leech = run_walk(LeechOptions::default());
    let docs = leech.docs();

    assert_eq!(
        docs[MODULE],
        "Package fixture is a test module.\n\nIt exercises the documentation walk."
    );
    assert_eq!(docs[&key(".Version")], "Version is the fixture version.");
    assert_eq!(docs[&key(".LevelDebug")], "LevelDebug is the most verbose level.");
    assert_eq!(docs[&key(".LevelInfo")], "Log levels.");
    assert_eq!(docs[&key(".LevelError")], "Log levels.");
    assert_eq!(docs[&key(".Options")], "Options configures a Client.");
    assert_eq!(docs[&key(".Options.Addr")], "Addr is the server address.");
    assert_eq!(docs[&key(".Client")], "Client talks to the server.");
    assert_eq!(docs[&key(".Client.NewClient")], "NewClient creates a Client.");
    assert_eq!(docs[&key(".Client.Do")], "Do performs a request.");
    assert_eq!(docs[&key(".Mode.Parse")], "Parse parses a mode.");

    assert_eq!(docs[&key("/store")], "Package store persists values.");
    assert_eq!(docs[&key("/store.Store")], "Store is a key-value store.");
    assert_eq!(docs[&key("/store.Store.Get")], "Get returns the value for key.");
    assert_eq!(docs[&key("/store.Memory.NewMemory")], "NewMemory returns an empty Memory.");
    assert_eq!(docs[&key("/store.Memory.Get")], "Get implements Store.");
    assert_eq!(docs[&key("/store.DefaultTTL")], "DefaultTTL is unused.");
    assert_eq!(docs[&key("/internal/util.Join")], "Join joins strings.");

    // Undocumented and unexported declarations have no entry.
    for missing in [
        ".ErrClosed",
        ".Mode",
        ".Helper",
        ".Client.Close",
        ".Options.Timeout",
        ".levelHidden",
        ".internalHelper",
        "/internal/util",
    ] {
        assert!(!docs.contains_key(&key(missing)), "unexpected doc for {}", missing);
    }
}

#[test]
fn test_comments_map() {
    let leech = run_walk(LeechOptions::default());

    let expected: BTreeMap<String, String> = [
        (key(".LevelInfo"), "default"),
        (key(".Options.Timeout"), "seconds"),
        (key(".Version"), "semver"),
        (key("/store.Store.Put"), "overwrites existing values"),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_string()))
    .collect();

    assert_eq!(leech.comments(), &expected);
}

#[test]
fn test_skipped_sources() {
    let leech = run_walk(LeechOptions::default());
    let docs = leech.docs();

    assert!(!docs.keys().any(|k| k.contains("/vendor")), "vendor must stay hidden");
    assert!(!docs.keys().any(|k| k.contains("/testdata")), "testdata is skipped");
    assert!(!docs.keys().any(|k| k.contains("_scratch")), "underscore dirs are skipped");
    assert!(!docs.contains_key(&key(".TestOnly")), "test files are skipped");
    assert!(!docs.contains_key(&key(".Tool")), "ignored files are skipped");
}

#[test]
fn test_platform_variants_counted_once() {
    let mut leech = Leech::new(namespace(), LeechOptions::default()).expect("should create leech");
    leech.walk("example.com/fixture/platform").expect("walk should succeed");

    // One of open_linux.go, open_windows.go, open_other.go builds on any host.
    assert_eq!(leech.coverage().funcs, Counter { total: 1, documented: 1 });
    assert_eq!(leech.coverage().values, Counter { total: 1, documented: 1 });
    assert_eq!(
        leech.docs()["example.com/fixture/platform.Open"],
        "Open opens the device."
    );
    assert_eq!(
        leech.docs()["example.com/fixture/platform"],
        "Package platform wraps OS handles."
    );
}

#[test]
fn test_walk_is_deterministic() {
    let first = run_walk(LeechOptions::default());
    let second = run_walk(LeechOptions::default());
    assert_eq!(first.docs(), second.docs());
    assert_eq!(first.comments(), second.comments());
    assert_eq!(first.coverage(), second.coverage());

    let temp = TempDir::new().expect("should create temp dir");
    let a = temp.path().join("a.json");
    let b = temp.path().join("b.json");
    first.save_docs(&a).expect("should save docs");
    second.save_docs(&b).expect("should save docs");
    assert_eq!(
        std::fs::read(&a).expect("should read a.json"),
        std::fs::read(&b).expect("should read b.json")
    );
}

#[test]
fn test_walking_twice_keeps_maps() {
    let mut leech = run_walk(LeechOptions::default());
    let docs = leech.docs().clone();
    let comments = leech.comments().clone();
    let funcs = leech.coverage().funcs;

    leech.walk(MODULE).expect("second walk should succeed");

    assert_eq!(leech.docs(), &docs);
    assert_eq!(leech.comments(), &comments);
    assert_eq!(leech.coverage().funcs.total, funcs.total * 2);
}

#[test]
fn test_saved_maps_round_trip() {
    let leech = run_walk(LeechOptions {
        pretty: true,
        ..Default::default()
    });

    let temp = TempDir::new().expect("should create temp dir");
    let docs_path = temp.path().join("docs.json");
    let comments_path = temp.path().join("comments.json");
    leech.save_docs(&docs_path).expect("should save docs");
    leech.save_comments(&comments_path).expect("should save comments");

    let content = std::fs::read_to_string(&docs_path).expect("should read docs");
    assert!(content.contains("\n  \""), "pretty output should be indented");
    let docs: BTreeMap<String, String> = serde_json::from_str(&content).expect("valid JSON");
    assert_eq!(&docs, leech.docs());

    let content = std::fs::read_to_string(&comments_path).expect("should read comments");
    let comments: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");
    assert_eq!(comments[key(".Version")], "semver");
}

#[test]
fn test_excluded_directories() {
    let mut builder = GlobSetBuilder::new();
    builder.add(Glob::new("internal/**").expect("valid glob"));
    builder.add(Glob::new("internal").expect("valid glob"));
    let leech = run_walk(LeechOptions {
        exclude: Some(builder.build().expect("valid glob set")),
        ..Default::default()
    });

    assert!(!leech.docs().contains_key(&key("/internal/util.Join")));
    assert_eq!(leech.coverage().funcs, Counter { total: 10, documented: 6 });
}

#[test]
fn test_include_unexported() {
    let leech = run_walk(LeechOptions {
        mode: ReaderMode {
            include_unexported: true,
        },
        ..Default::default()
    });

    // internalHelper joins the count; levelHidden sits in an existing group.
    assert_eq!(leech.coverage().funcs, Counter { total: 12, documented: 7 });
    assert_eq!(leech.coverage().values, Counter { total: 5, documented: 4 });
    assert_eq!(leech.docs()[&key(".levelHidden")], "Log levels.");
}

#[test]
fn test_sub_package_walk() {
    let mut leech = Leech::new(namespace(), LeechOptions::default()).expect("should create leech");
    leech.walk("example.com/fixture/store").expect("walk should succeed");

    assert!(leech.docs().keys().all(|k| k.starts_with("example.com/fixture/store")));
    assert_eq!(leech.coverage().types, Counter { total: 2, documented: 2 });
    assert_eq!(leech.coverage().funcs, Counter { total: 3, documented: 2 });
}

#[test]
fn test_codegen_from_walk() {
    let leech = run_walk(LeechOptions::default());
    let source = codegen::generate("docs", leech.docs(), leech.comments());

    assert!(source.starts_with("// Code generated by leech. DO NOT EDIT.\n\npackage docs\n"));
    assert!(source.contains(
        "\t\"example.com/fixture.Version\": \"Version is the fixture version.\",\n"
    ));
    assert!(source.contains("\t\"example.com/fixture.Version\": \"semver\",\n"));
    assert!(source.contains(
        "\t\"example.com/fixture\": \"Package fixture is a test module.\\n\\nIt exercises the documentation walk.\",\n"
    ));
}
