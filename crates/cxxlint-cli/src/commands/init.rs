//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# cxxlint configuration

# recommended | strict | minimal
preset = "recommended"

# Exit with 1 when error-severity violations remain
fail_on_error = true

# text | json | pretty
format = "text"

# Functions with more parameters than this are reported
parameter_count_threshold = 4

[analyzer]
# Glob patterns to exclude from analysis
exclude = [
    "**/build/**",
    "**/third_party/**",
]

# Respect .gitignore files
respect_gitignore = true

# timeout_secs = 120

[formatter]
enabled = false
command = "clang-format"
# args = ["--style=file"]
# required = false

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.naming-casing]
enabled = true
# severity = "warning"
# allow_names = ["HRESULT_CALLBACK"]

[rules.no-c-style-cast]
# `(void)expr` discards are not reported
allow_void_discard = true

# [rules.long-parameter-list]
# threshold = 6

# [rules.adjacent-same-type-parameters]
# enabled = true
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new("cxxlint.toml"), force)?;

    println!("Created cxxlint.toml");
    println!("\nNext steps:");
    println!("  1. Edit cxxlint.toml to configure rules");
    println!("  2. Run: cxxlint check");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxlint_core::Config;
    use tempfile::TempDir;

    #[test]
    fn default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.preset.as_deref(), Some("recommended"));
        assert!(config.fail_on_error);
        assert!(config.rule_config("no-c-style-cast").is_some());
    }

    #[test]
    fn existing_file_needs_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cxxlint.toml");
        std::fs::write(&path, "preset = \"minimal\"\n").unwrap();

        assert!(write_config(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "preset = \"minimal\"\n");

        write_config(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
