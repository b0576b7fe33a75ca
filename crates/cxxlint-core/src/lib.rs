//! # cxxlint-core
//!
//! Core framework for C++ convention linting on top of `cxxlint-syntax`.
//!
//! This crate provides the foundational traits and types for building
//! convention checks. It includes:
//!
//! - [`Rule`] trait for per-file checks over tokens and the declaration model
//! - [`Analyzer`] for discovering files and orchestrating a run
//! - [`SuppressionMap`] for `cxxlint: allow-*` comment markers
//! - [`fixer`] for validating and applying automatic fixes
//! - [`render`] for text, JSON and graphical reports
//! - [`Violation`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use cxxlint_core::{Analyzer, Config};
//!
//! let analyzer = Analyzer::builder()
//!     .root(".")
//!     .path("src")
//!     .config(Config::from_file("cxxlint.toml".as_ref())?)
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! print!("{}", cxxlint_core::render::render_text(&result.violations));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod note;
mod rule;
mod suppression;
mod types;

pub mod aggregate;
pub mod casing;
pub mod fixer;
pub mod formatter;
pub mod render;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use casing::Casing;
pub use config::{
    AnalyzerConfig, Config, ConfigError, FormatterConfig, OutputFormat, RuleConfig,
    DEFAULT_PARAMETER_COUNT_THRESHOLD,
};
pub use context::{FileContext, HEADER_EXTENSIONS, SOURCE_EXTENSIONS};
pub use fixer::{FixEdit, FixError};
pub use formatter::{ExternalFormatter, Formatter, FormatterError};
pub use note::EngineNote;
pub use rule::{Category, Rule, RuleBox};
pub use suppression::{Marker, MarkerKind, RuleFilter, SuppressionMap};
pub use types::{
    Applicability, Label, LintResult, Location, Replacement, RunStatus, Severity, Suggestion,
    Violation, ViolationDiagnostic,
};
