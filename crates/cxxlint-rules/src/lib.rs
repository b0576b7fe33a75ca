//! # cxxlint-rules
//!
//! Built-in C++ convention rules for cxxlint.
//!
//! ## Available Rules
//!
//! | Code | Name | Default | Fixable | Description |
//! |------|------|---------|---------|-------------|
//! | CX001 | `naming-casing` | error | yes | Identifier casing by declaration role |
//! | CX002 | `no-owning-raw-pointer` | warning | no | Raw pointers that own memory |
//! | CX003 | `no-c-style-cast` | warning | no | C-style casts |
//! | CX004 | `unscoped-enum` | warning | yes | Plain `enum` instead of `enum class` |
//! | CX005 | `long-parameter-list` | warning | no | More parameters than the threshold |
//! | CX006 | `adjacent-same-type-parameters` | info | no | Easily swapped adjacent parameters |
//! | CX007 | `header-guard` | warning | yes | Headers without `#pragma once` or a guard |
//!
//! ## Usage
//!
//! ```ignore
//! use cxxlint_core::{Analyzer, Config};
//! use cxxlint_rules::{build_rules, NamingCasing};
//!
//! let config = Config::default();
//! let mut builder = Analyzer::builder().root(".").path("src");
//! for rule in build_rules(&config, &[])? {
//!     builder = builder.rule_box(rule);
//! }
//! let analyzer = builder.config(config).build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adjacent_same_type_parameters;
pub mod header_guard;
pub mod long_parameter_list;
pub mod naming_casing;
pub mod no_c_style_cast;
pub mod no_owning_raw_pointer;
pub mod unscoped_enum;

mod presets;
mod registry;

pub use adjacent_same_type_parameters::AdjacentSameTypeParameters;
pub use header_guard::HeaderGuard;
pub use long_parameter_list::LongParameterList;
pub use naming_casing::NamingCasing;
pub use no_c_style_cast::NoCStyleCast;
pub use no_owning_raw_pointer::NoOwningRawPointer;
pub use presets::{all_rules, minimal_rules, recommended_rules, strict_rules, Preset};
pub use registry::{build_rules, normalize_rule_keys, parse_filter, unknown_rule_notes, RuleId};
pub use unscoped_enum::UnscopedEnum;

/// Re-export core types for convenience.
pub use cxxlint_core::{Rule, Severity, Violation};

#[cfg(test)]
pub(crate) mod testing {
    use cxxlint_core::{FileContext, Rule, Violation};
    use cxxlint_syntax::{extract, tokenize, Token};
    use std::path::Path;

    /// Runs `rule` on `code` as the only file of the check set.
    pub fn check_code(rule: &dyn Rule, code: &str, path: &str) -> Vec<Violation> {
        check_set(rule, code, path, 1)
    }

    /// Runs `rule` on `code` as one of `size` files.
    pub fn check_set(rule: &dyn Rule, code: &str, path: &str, size: usize) -> Vec<Violation> {
        let tokens: Vec<Token> = tokenize(code).collect();
        let model = extract(&tokens);
        let ctx = FileContext::new(Path::new(path), code, &tokens, &model, Path::new(""))
            .with_check_set_size(size);
        rule.check(&ctx)
    }
}
