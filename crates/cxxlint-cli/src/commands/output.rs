//! Shared output formatting for lint results.

use anyhow::Result;
use cxxlint_core::render::{render_json, render_pretty, render_text, summary};
use cxxlint_core::{LintResult, OutputFormat};
use std::io::IsTerminal;
use std::path::Path;

/// Print lint results in the specified format.
///
/// The report goes to stdout; the summary line goes to stderr, and is left
/// out of JSON output.
pub fn print(result: &LintResult, format: OutputFormat, root: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print!("{}", render_text(&result.violations));
            print_summary(result);
        }
        OutputFormat::Json => println!("{}", render_json(&result.violations)?),
        OutputFormat::Pretty => {
            print!(
                "{}",
                render_pretty(&result.violations, |file| {
                    std::fs::read_to_string(root.join(file)).ok()
                })
            );
            print_summary(result);
        }
    }
    Ok(())
}

fn print_summary(result: &LintResult) {
    let line = summary(result);
    if !std::io::stderr().is_terminal() {
        eprintln!("{line}");
        return;
    }

    let (errors, warnings, _) = result.count_by_severity();
    let color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };
    eprintln!("{color}{line}\x1b[0m");
}
