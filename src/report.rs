//! Output formatting for coverage results.
//!
//! Supports two output formats:
//! - Pretty: the comment-rate table, colored when stdout is a terminal
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::walk::{Counter, Coverage};

// =============================================================================
// Pretty Format
// =============================================================================

const HEADER: &str = "------Comment Rate------";
const FOOTER: &str = "------------------------";

/// Rates below this are highlighted.
const LOW_RATE: f64 = 50.0;

/// Render the comment-rate table without color.
pub fn render_pretty(coverage: &Coverage) -> String {
    render_table(coverage, |rate, _| rate)
}

/// Render the table as printed: low rates red, others green, n/a dimmed.
fn render_colored(coverage: &Coverage) -> String {
    render_table(coverage, |rate, counter| {
        let rate = match counter.rate() {
            Some(r) if r < LOW_RATE => rate.red(),
            Some(_) => rate.green(),
            None => rate.dimmed(),
        };
        rate.to_string()
    })
}

fn render_table(coverage: &Coverage, paint: impl Fn(String, &Counter) -> String) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for (label, counter) in rows(coverage) {
        out.push_str(&format!("{:>11}: {}\n", label, paint(format_rate(counter), counter)));
    }
    out.push_str(FOOTER);
    out.push('\n');
    out
}

/// Write the comment-rate table to stdout.
pub fn write_pretty(coverage: &Coverage) {
    print!("{}", render_colored(coverage));
}

fn rows(coverage: &Coverage) -> [(&'static str, &Counter); 3] {
    [
        ("Type", &coverage.types),
        ("Func", &coverage.funcs),
        ("Value", &coverage.values),
    ]
}

/// `" 75.00%"`, or `"   n/a"` when nothing of that kind exists.
fn format_rate(counter: &Counter) -> String {
    match counter.rate() {
        Some(rate) => format!("{:6.2}%", rate),
        None => format!("{:>6}", "n/a"),
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub module: String,
    pub types: JsonCounter,
    pub funcs: JsonCounter,
    pub values: JsonCounter,
    pub docs: usize,
    pub comments: usize,
}

/// One declaration kind.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonCounter {
    pub total: usize,
    pub documented: usize,
    /// Percentage, null when total is zero.
    pub rate: Option<f64>,
}

impl From<&Counter> for JsonCounter {
    fn from(c: &Counter) -> Self {
        Self {
            total: c.total,
            documented: c.documented,
            rate: c.rate(),
        }
    }
}

/// Build the JSON report.
pub fn json_report(module: &str, coverage: &Coverage, docs: usize, comments: usize) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        module: module.to_string(),
        types: (&coverage.types).into(),
        funcs: (&coverage.funcs).into(),
        values: (&coverage.values).into(),
        docs,
        comments,
    }
}

/// Write results in JSON format to stdout.
pub fn write_json(module: &str, coverage: &Coverage, docs: usize, comments: usize) -> anyhow::Result<()> {
    let report = json_report(module, coverage, docs, comments);
    let json = serde_json::to_string_pretty(&report)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}
