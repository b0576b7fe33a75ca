//! Core analyzer for orchestrating lint execution.
//!
//! A run has three phases:
//!
//! 1. Per-file pipelines (read, tokenize, extract, rules, suppression) run in
//!    parallel on a bounded pool. Each pipeline owns its file's data.
//! 2. The results are collected and merged single-threadedly.
//! 3. Fixes and the external formatter run per file after the merge.

use crate::aggregate::aggregate;
use crate::config::{Config, ConfigError, RuleConfig};
use crate::context::{FileContext, SOURCE_EXTENSIONS};
use crate::fixer::fix_source;
use crate::formatter::{check_formatting, ExternalFormatter, Formatter};
use crate::note::EngineNote;
use crate::rule::{Rule, RuleBox};
use crate::suppression::SuppressionMap;
use crate::types::{LintResult, Location, Severity, Violation};

use cxxlint_syntax::{extract, tokenize, Token};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a run before any file is reported.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error resolving paths.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An input path does not exist.
    #[error("Path not found: {}", path.display())]
    MissingPath {
        /// The missing path.
        path: PathBuf,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Directory traversal error.
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Worker pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    paths: Vec<PathBuf>,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    include_patterns: Vec<String>,
    config: Option<Config>,
    formatter: Option<Box<dyn Formatter>>,
    parallelism: Option<usize>,
    timeout: Option<Duration>,
    fix: Option<bool>,
    notes: Vec<Violation>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project root that report paths are relative to.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a file or directory to check. Without paths the root is checked.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Adds several files or directories to check.
    #[must_use]
    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds an include glob pattern.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the formatter collaborator, overriding `[formatter]`.
    #[must_use]
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Sets the whole-run timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables or disables fix mode, overriding the configuration.
    #[must_use]
    pub fn fix(mut self, fix: bool) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Adds a note to include in the report, such as a configuration warning.
    #[must_use]
    pub fn note(mut self, note: Violation) -> Self {
        self.notes.push(note);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined or a
    /// glob pattern is invalid.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();
        let cwd = std::env::current_dir()?;
        let absolute = |p: PathBuf| if p.is_absolute() { p } else { cwd.join(p) };

        let root = absolute(self.root.unwrap_or_else(|| PathBuf::from(".")));
        let paths = self.paths.into_iter().map(absolute).collect();

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        let mut include_patterns = self.include_patterns;
        include_patterns.extend(config.analyzer.include.iter().cloned());

        let formatter = self.formatter.or_else(|| {
            config
                .formatter
                .enabled
                .then(|| Box::new(ExternalFormatter::from_config(&config.formatter)) as Box<dyn Formatter>)
        });

        Ok(Analyzer {
            root,
            paths,
            rules: self.rules,
            exclude: compile(&exclude_patterns)?,
            include: compile(&include_patterns)?,
            formatter,
            parallelism: self.parallelism.or(config.analyzer.parallelism).unwrap_or(0),
            timeout: self
                .timeout
                .or(config.analyzer.timeout_secs.map(Duration::from_secs)),
            fix: self.fix.unwrap_or(config.fix),
            notes: self.notes,
            config,
        })
    }
}

fn compile(patterns: &[String]) -> Result<Vec<glob::Pattern>, glob::PatternError> {
    patterns.iter().map(|p| glob::Pattern::new(p)).collect()
}

/// Per-file pipeline result.
struct FileOutcome {
    path: PathBuf,
    relative: PathBuf,
    content: Option<String>,
    /// The file was not valid UTF-8 and `content` is a lossy decoding.
    lossy: bool,
    violations: Vec<Violation>,
    suppressed: usize,
}

/// Per-file fix result.
struct FixOutcome {
    relative: PathBuf,
    content: Option<String>,
    applied: bool,
    notes: Vec<Violation>,
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    paths: Vec<PathBuf>,
    rules: Vec<RuleBox>,
    exclude: Vec<glob::Pattern>,
    include: Vec<glob::Pattern>,
    formatter: Option<Box<dyn Formatter>>,
    parallelism: usize,
    timeout: Option<Duration>,
    fix: bool,
    notes: Vec<Violation>,
    config: Config,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the rule configuration for a specific rule.
    #[must_use]
    pub fn rule_config(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.config.rules.get(rule_name)
    }

    /// Analyzes all files and returns the results.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails or the worker pool cannot be
    /// started. Problems with individual files are reported as notes.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {}", self.root.display());

        let files = self.discover_files()?;
        let check_set_size = files.len();
        info!("Found {} files to analyze", check_set_size);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()?;
        let deadline = self.timeout.map(|t| Instant::now() + t);

        let outcomes: Vec<Option<FileOutcome>> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        debug!("Timeout reached, skipping {}", path.display());
                        return None;
                    }
                    Some(self.analyze_file(path, check_set_size))
                })
                .collect()
        });

        let mut result = LintResult::new();
        result.incomplete = outcomes.iter().any(Option::is_none);
        if result.incomplete {
            warn!("Run timed out; reporting partial results");
        }
        let mut outcomes: Vec<FileOutcome> = outcomes.into_iter().flatten().collect();

        let mut violations = self.notes.clone();
        for outcome in &mut outcomes {
            if outcome.content.is_some() {
                result.files_checked += 1;
            }
            result.suppressed += outcome.suppressed;
            violations.append(&mut outcome.violations);
        }
        let mut violations = aggregate(violations);

        if self.fix {
            let fixes: Vec<FixOutcome> =
                pool.install(|| outcomes.par_iter().filter_map(|o| self.fix_file(o, &violations)).collect());
            for fix in fixes {
                if fix.applied {
                    let before = violations.len();
                    violations.retain(|v| v.location.file != fix.relative || !v.is_fixable());
                    result.fixes_applied += before - violations.len();
                }
                if let Some(content) = fix.content {
                    if let Some(o) = outcomes.iter_mut().find(|o| o.relative == fix.relative) {
                        o.content = Some(content);
                    }
                }
                violations.extend(fix.notes);
            }
        }

        if let Some(formatter) = &self.formatter {
            let required = self.config.formatter.required;
            let notes: Vec<Violation> = pool.install(|| {
                outcomes
                    .par_iter()
                    .filter_map(|o| {
                        let content = o.content.as_deref()?;
                        check_formatting(
                            formatter.as_ref(),
                            &o.path,
                            o.relative.clone(),
                            content,
                            required,
                        )
                    })
                    .collect()
            });
            violations.extend(notes);
        }

        result.violations = aggregate(violations);

        info!(
            "Analysis complete: {} violations in {} files",
            result.violations.len(),
            result.files_checked
        );

        Ok(result)
    }

    /// Runs the per-file pipeline.
    fn analyze_file(&self, path: &Path, check_set_size: usize) -> FileOutcome {
        debug!("Analyzing: {}", path.display());
        let relative = self.relative(path);

        let (content, lossy) = match std::fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => (content, false),
                Err(e) => {
                    debug!("{} is not valid UTF-8, decoding lossily", path.display());
                    (String::from_utf8_lossy(e.as_bytes()).into_owned(), true)
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return FileOutcome {
                    path: path.to_path_buf(),
                    violations: vec![EngineNote::Io.violation(
                        Severity::Warning,
                        Location::new(relative.clone(), 1, 1),
                        format!("cannot read file: {e}"),
                    )],
                    relative,
                    content: None,
                    lossy: false,
                    suppressed: 0,
                };
            }
        };

        let tokens: Vec<Token> = tokenize(&content).collect();
        let model = extract(&tokens);
        let ctx = FileContext::new(path, &content, &tokens, &model, &self.root)
            .with_check_set_size(check_set_size);

        let mut violations = Vec::new();
        for rule in &self.rules {
            if !self.config.is_rule_enabled(rule.name()) {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| rule.check(&ctx))) {
                Ok(found) => violations.extend(self.apply_severity_override(rule.name(), found)),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!("Rule {} failed on {}: {}", rule.name(), path.display(), message);
                    violations.push(EngineNote::RuleError.violation(
                        Severity::Warning,
                        Location::new(relative.clone(), 1, 1),
                        format!("rule `{}` failed on this file: {message}", rule.name()),
                    ));
                }
            }
        }

        let (suppressions, mut marker_notes) = SuppressionMap::build(&ctx);
        let suppressed = suppressions.apply(&mut violations);
        violations.append(&mut marker_notes);

        if self.config.report_unparsed {
            violations.extend(model.notes().iter().map(|note| {
                EngineNote::UnparsedRegion.violation(
                    Severity::Info,
                    ctx.location(&note.span),
                    note.message.clone(),
                )
            }));
        }

        for v in &mut violations {
            clamp(&mut v.location, content.len());
        }

        FileOutcome {
            path: path.to_path_buf(),
            relative,
            content: Some(content),
            lossy,
            violations,
            suppressed,
        }
    }

    /// Applies the remaining fixable violations of one file.
    fn fix_file(&self, outcome: &FileOutcome, violations: &[Violation]) -> Option<FixOutcome> {
        let content = outcome.content.as_deref()?;
        let fixable: Vec<&Violation> = violations
            .iter()
            .filter(|v| v.location.file == outcome.relative && v.is_fixable())
            .collect();
        if fixable.is_empty() {
            return None;
        }

        let mut fix = FixOutcome {
            relative: outcome.relative.clone(),
            content: None,
            applied: false,
            notes: Vec::new(),
        };
        let location = Location::new(outcome.relative.clone(), 1, 1);
        if outcome.lossy {
            warn!("Not fixing {}: not valid UTF-8", outcome.relative.display());
            fix.notes.push(EngineNote::Fix.violation(
                Severity::Warning,
                location,
                "fixes not applied: file is not valid UTF-8",
            ));
            return Some(fix);
        }
        match fix_source(content, fixable) {
            Ok(None) => return None,
            Ok(Some(fixed)) => match std::fs::write(&outcome.path, &fixed) {
                Ok(()) => {
                    info!("Fixed {}", outcome.relative.display());
                    fix.applied = true;
                    fix.content = Some(fixed);
                }
                Err(e) => {
                    warn!("Failed to write {}: {}", outcome.path.display(), e);
                    fix.notes.push(EngineNote::Io.violation(
                        Severity::Warning,
                        location,
                        format!("cannot write fixed file: {e}"),
                    ));
                }
            },
            Err(e) => {
                warn!("Not fixing {}: {}", outcome.relative.display(), e);
                fix.notes.push(EngineNote::Fix.violation(
                    Severity::Warning,
                    location,
                    format!("fixes not applied: {e}"),
                ));
            }
        }
        Some(fix)
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(
        &self,
        rule_name: &str,
        mut violations: Vec<Violation>,
    ) -> Vec<Violation> {
        if let Some(severity) = self.config.rule_severity(rule_name) {
            for v in &mut violations {
                v.severity = severity;
            }
        }
        violations
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }

    /// Discovers the C++ files to analyze, sorted and without duplicates.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let inputs = if self.paths.is_empty() {
            std::slice::from_ref(&self.root)
        } else {
            self.paths.as_slice()
        };

        let mut files = BTreeSet::new();
        for input in inputs {
            if input.is_file() {
                if !self.should_exclude(input) {
                    files.insert(input.clone());
                }
                continue;
            }
            if !input.exists() {
                return Err(AnalyzerError::MissingPath {
                    path: input.clone(),
                });
            }

            let respect = self.config.analyzer.respect_gitignore;
            let mut walker = ignore::WalkBuilder::new(input);
            walker
                .hidden(false)
                .git_ignore(respect)
                .git_exclude(respect)
                .git_global(respect)
                .ignore(respect)
                .parents(respect)
                .require_git(false);

            for entry in walker.build() {
                let entry = entry?;
                let path = entry.path();
                if !path.is_file() || !is_source_file(path) {
                    continue;
                }
                if !self.include.is_empty() && !self.matches_any(&self.include, path) {
                    continue;
                }
                if self.should_exclude(path) {
                    debug!("Excluding: {}", path.display());
                    continue;
                }
                files.insert(path.to_path_buf());
            }
        }

        Ok(files.into_iter().collect())
    }

    /// Checks if a path should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        self.matches_any(&self.exclude, path)
    }

    fn matches_any(&self, patterns: &[glob::Pattern], path: &Path) -> bool {
        let relative = self.relative(path);
        patterns
            .iter()
            .any(|p| p.matches_path(&relative) || p.matches_path(path))
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn clamp(location: &mut Location, len: usize) {
    location.offset = location.offset.min(len);
    location.length = location.length.min(len - location.offset);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Category;

    struct Panics;

    impl Rule for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }
        fn code(&self) -> &'static str {
            "TEST900"
        }
        fn category(&self) -> Category {
            Category::Interface
        }
        fn check(&self, _ctx: &FileContext) -> Vec<Violation> {
            panic!("boom")
        }
    }

    #[test]
    fn test_builder() {
        let analyzer = Analyzer::builder()
            .root(".")
            .exclude("**/build/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.root().exists());
        assert_eq!(analyzer.rule_count(), 0);
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root("/proj")
            .exclude("vendor/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/proj/build/debug/gen.cpp")));
        assert!(analyzer.should_exclude(Path::new("/proj/src/third_party/zlib.h")));
        assert!(analyzer.should_exclude(Path::new("/proj/vendor/lib.cpp")));
        assert!(!analyzer.should_exclude(Path::new("/proj/src/lib.cpp")));
    }

    #[test]
    fn test_invalid_glob() {
        assert!(matches!(
            Analyzer::builder().exclude("[").build(),
            Err(AnalyzerError::Glob(_))
        ));
    }

    #[test]
    fn test_source_extensions() {
        assert!(is_source_file(Path::new("a.cpp")));
        assert!(is_source_file(Path::new("a.HPP")));
        assert!(!is_source_file(Path::new("a.rs")));
        assert!(!is_source_file(Path::new("CMakeLists.txt")));
    }

    #[test]
    fn test_clamp() {
        let mut loc = Location::new(PathBuf::from("a.cpp"), 1, 1).with_span(8, 10);
        clamp(&mut loc, 10);
        assert_eq!((loc.offset, loc.length), (8, 2));
    }

    #[test]
    fn test_rule_panic_becomes_note() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.cpp"), "int x;\n").expect("write");
        let result = Analyzer::builder()
            .root(dir.path())
            .rule(Panics)
            .build()
            .expect("builds")
            .analyze()
            .expect("analyzes");
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].code, "CX902");
        assert!(result.violations[0].message.contains("boom"));
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = Analyzer::builder()
            .root(dir.path())
            .path(dir.path().join("nope"))
            .build()
            .expect("builds")
            .analyze();
        assert!(matches!(result, Err(AnalyzerError::MissingPath { .. })));
    }

    #[test]
    fn test_zero_timeout_is_incomplete() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.cpp"), "int x;\n").expect("write");
        let result = Analyzer::builder()
            .root(dir.path())
            .timeout(Duration::ZERO)
            .build()
            .expect("builds")
            .analyze()
            .expect("analyzes");
        assert!(result.incomplete);
        assert_eq!(result.files_checked, 0);
    }
}
