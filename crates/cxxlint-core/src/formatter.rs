//! External formatter collaborator.
//!
//! The formatter is run as `command args... path` and must print the
//! formatted file on stdout. Differences from the file on disk are reported
//! as notes; the engine never writes formatter output back.

use crate::config::FormatterConfig;
use crate::note::EngineNote;
use crate::types::{Location, Severity, Violation};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from running the formatter.
#[derive(Debug, Error)]
pub enum FormatterError {
    /// The process could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Command that failed to start.
        command: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    Status {
        /// Command that failed.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The output was not valid UTF-8.
    #[error("`{command}` produced non UTF-8 output")]
    Utf8 {
        /// Command that produced the output.
        command: String,
    },
}

/// Produces the formatted text of a file.
pub trait Formatter: Send + Sync {
    /// Name shown in diagnostics.
    fn name(&self) -> &str;

    /// Returns the formatted contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the formatter cannot run or fails.
    fn format(&self, path: &Path) -> Result<String, FormatterError>;
}

/// Formatter backed by an external executable such as `clang-format`.
#[derive(Debug, Clone)]
pub struct ExternalFormatter {
    command: String,
    args: Vec<String>,
}

impl ExternalFormatter {
    /// Creates a formatter running `command` with `args` before the path.
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Creates a formatter from configuration.
    #[must_use]
    pub fn from_config(config: &FormatterConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    fn spawn(&self, path: &Path) -> std::io::Result<Output> {
        Command::new(&self.command).args(&self.args).arg(path).output()
    }
}

impl Formatter for ExternalFormatter {
    fn name(&self) -> &str {
        &self.command
    }

    fn format(&self, path: &Path) -> Result<String, FormatterError> {
        let output = match self.spawn(path) {
            Ok(output) => output,
            Err(first) => {
                debug!("Retrying `{}` after spawn failure: {}", self.command, first);
                self.spawn(path).map_err(|source| FormatterError::Spawn {
                    command: self.command.clone(),
                    source,
                })?
            }
        };

        if !output.status.success() {
            return Err(FormatterError::Status {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| FormatterError::Utf8 {
            command: self.command.clone(),
        })
    }
}

/// 1-indexed line of the first difference between two texts.
fn first_difference(a: &str, b: &str) -> usize {
    let mut left = a.split_inclusive('\n');
    let mut right = b.split_inclusive('\n');
    let mut line = 1;
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) if x == y => line += 1,
            _ => return line,
        }
    }
}

/// Runs `formatter` on one file and turns the outcome into a note.
///
/// Returns `None` when the file is already formatted. Differences are
/// informational and failures are warnings, unless `required` makes both
/// errors.
#[must_use]
pub fn check_formatting(
    formatter: &dyn Formatter,
    path: &Path,
    relative_path: PathBuf,
    content: &str,
    required: bool,
) -> Option<Violation> {
    match formatter.format(path) {
        Ok(formatted) if formatted == content => None,
        Ok(formatted) => {
            let line = first_difference(content, &formatted);
            let severity = if required {
                Severity::Error
            } else {
                Severity::Info
            };
            Some(EngineNote::Formatter.violation(
                severity,
                Location::new(relative_path, line, 1),
                format!(
                    "file differs from `{}` output (first difference at line {line})",
                    formatter.name()
                ),
            ))
        }
        Err(e) => {
            warn!("Formatter failed on {}: {}", path.display(), e);
            let severity = if required {
                Severity::Error
            } else {
                Severity::Warning
            };
            Some(EngineNote::Formatter.violation(
                severity,
                Location::new(relative_path, 1, 1),
                e.to_string(),
            ))
        }
    }
}
