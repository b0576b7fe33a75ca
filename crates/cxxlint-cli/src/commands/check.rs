//! Check command implementation.

use anyhow::{Context, Result};
use cxxlint_core::{Analyzer, Config, OutputFormat, RunStatus};
use cxxlint_rules::{build_rules, normalize_rule_keys, parse_filter, unknown_rule_notes};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config_resolver::{self, ConfigSource};

/// Flags of the `check` subcommand. `None` leaves the configured value.
#[derive(Debug, Default)]
pub struct CheckOptions {
    pub paths: Vec<PathBuf>,
    pub fix: bool,
    pub format: Option<OutputFormat>,
    pub fail_on_error: Option<bool>,
    pub rules: Option<String>,
    pub exclude: Vec<String>,
    pub jobs: Option<usize>,
    pub timeout: Option<u64>,
}

/// Runs the check command and returns the run status.
pub fn run(options: &CheckOptions, explicit_config: Option<&Path>) -> Result<RunStatus> {
    let root = project_dir(&options.paths);
    let source = config_resolver::resolve(&root, explicit_config);
    let mut config = load_config(&source)?;
    normalize_rule_keys(&mut config);

    if options.fix {
        config.fix = true;
    }
    if let Some(format) = options.format {
        config.format = format;
    }
    if let Some(fail_on_error) = options.fail_on_error {
        config.fail_on_error = fail_on_error;
    }

    let filter = match &options.rules {
        Some(list) => {
            let ids: Vec<&str> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            parse_filter(&ids)?
        }
        None => Vec::new(),
    };
    let rules = build_rules(&config, &filter)?;

    let mut builder = Analyzer::builder().root(&root);
    for path in &options.paths {
        if *path != root {
            builder = builder.path(path);
        }
    }
    for pattern in &options.exclude {
        builder = builder.exclude(pattern.clone());
    }
    for note in unknown_rule_notes(&config) {
        builder = builder.note(note);
    }
    for rule in rules {
        builder = builder.rule_box(rule);
    }
    if let Some(jobs) = options.jobs {
        builder = builder.parallelism(jobs);
    }
    if let Some(secs) = options.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    let format = config.format;
    let fail_on_error = config.fail_on_error;
    let analyzer = builder
        .config(config)
        .build()
        .context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {} with {} rules",
        root.display(),
        analyzer.rule_count()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, format, analyzer.root())?;

    let status = result.status(fail_on_error);
    tracing::debug!("Run status: {:?}", status);
    Ok(status)
}

/// Directory used for config lookup and as the report root.
///
/// A single directory argument is the project; anything else is analyzed
/// relative to the working directory.
fn project_dir(paths: &[PathBuf]) -> PathBuf {
    match paths {
        [only] if only.is_dir() => only.clone(),
        _ => PathBuf::from("."),
    }
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    let Some(path) = source.path() else {
        tracing::debug!("No configuration file found, using defaults");
        return Ok(Config::default());
    };
    if source.is_global() {
        tracing::info!("Using global config: {}", path.display());
    }
    Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options(root: &Path) -> CheckOptions {
        CheckOptions {
            paths: vec![root.to_path_buf()],
            format: Some(OutputFormat::Json),
            ..CheckOptions::default()
        }
    }

    #[test]
    fn error_violation_fails_the_run() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cpp"), "int BadName = 1;\n").unwrap();

        let status = run(&options(tmp.path()), None).unwrap();
        assert_eq!(status, RunStatus::Fail);
        assert_eq!(status.exit_code(), 1);
    }

    #[test]
    fn fail_on_error_flag_overrides_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cpp"), "int BadName = 1;\n").unwrap();

        let mut opts = options(tmp.path());
        opts.fail_on_error = Some(false);
        assert_eq!(run(&opts, None).unwrap().exit_code(), 0);
    }

    #[test]
    fn project_config_is_picked_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cpp"), "int BadName = 1;\n").unwrap();
        fs::write(
            tmp.path().join("cxxlint.toml"),
            "[rules.naming-casing]\nseverity = \"warning\"\n",
        )
        .unwrap();

        let status = run(&options(tmp.path()), None).unwrap();
        assert_eq!(status, RunStatus::PassWithWarnings);
    }

    #[test]
    fn rules_filter_limits_checks() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cpp"), "int BadName = 1;\nenum E { A };\n").unwrap();

        let mut opts = options(tmp.path());
        opts.rules = Some("CX004".to_string());
        assert_eq!(run(&opts, None).unwrap(), RunStatus::PassWithWarnings);
    }

    #[test]
    fn unknown_rule_filter_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(tmp.path());
        opts.rules = Some("no-goto".to_string());
        let err = run(&opts, None).unwrap_err();
        assert!(err.to_string().contains("no-goto"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("broken.toml");
        fs::write(&config, "no_such_key = 1\n").unwrap();

        assert!(run(&options(tmp.path()), Some(&config)).is_err());
    }

    #[test]
    fn fix_rewrites_files() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("color.cpp");
        fs::write(&file, "enum Color { Red };\n").unwrap();

        let mut opts = options(tmp.path());
        opts.fix = true;
        assert_eq!(run(&opts, None).unwrap(), RunStatus::Pass);
        assert_eq!(
            fs::read_to_string(file).unwrap(),
            "enum class Color { Red };\n"
        );
    }
}
