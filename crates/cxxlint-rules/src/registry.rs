//! Closed registry of built-in rules.
//!
//! Every rule the engine knows is a [`RuleId`]. Configuration keys, `--rules`
//! filters and suppression markers all resolve through it, so an identifier
//! that is not listed here never reaches the analyzer.

use crate::presets::Preset;
use crate::{
    adjacent_same_type_parameters, header_guard, long_parameter_list, naming_casing,
    no_c_style_cast, no_owning_raw_pointer, unscoped_enum,
};
use crate::{
    AdjacentSameTypeParameters, HeaderGuard, LongParameterList, NamingCasing, NoCStyleCast,
    NoOwningRawPointer, UnscopedEnum,
};
use cxxlint_core::{Config, ConfigError, EngineNote, Location, RuleBox, Severity, Violation};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Identifier of a built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleId {
    /// `CX001 naming-casing`
    NamingCasing,
    /// `CX002 no-owning-raw-pointer`
    NoOwningRawPointer,
    /// `CX003 no-c-style-cast`
    NoCStyleCast,
    /// `CX004 unscoped-enum`
    UnscopedEnum,
    /// `CX005 long-parameter-list`
    LongParameterList,
    /// `CX006 adjacent-same-type-parameters`
    AdjacentSameTypeParameters,
    /// `CX007 header-guard`
    HeaderGuard,
}

impl RuleId {
    /// Every built-in rule, in code order.
    pub const ALL: [Self; 7] = [
        Self::NamingCasing,
        Self::NoOwningRawPointer,
        Self::NoCStyleCast,
        Self::UnscopedEnum,
        Self::LongParameterList,
        Self::AdjacentSameTypeParameters,
        Self::HeaderGuard,
    ];

    /// Rule name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NamingCasing => naming_casing::NAME,
            Self::NoOwningRawPointer => no_owning_raw_pointer::NAME,
            Self::NoCStyleCast => no_c_style_cast::NAME,
            Self::UnscopedEnum => unscoped_enum::NAME,
            Self::LongParameterList => long_parameter_list::NAME,
            Self::AdjacentSameTypeParameters => adjacent_same_type_parameters::NAME,
            Self::HeaderGuard => header_guard::NAME,
        }
    }

    /// Rule code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::NamingCasing => naming_casing::CODE,
            Self::NoOwningRawPointer => no_owning_raw_pointer::CODE,
            Self::NoCStyleCast => no_c_style_cast::CODE,
            Self::UnscopedEnum => unscoped_enum::CODE,
            Self::LongParameterList => long_parameter_list::CODE,
            Self::AdjacentSameTypeParameters => adjacent_same_type_parameters::CODE,
            Self::HeaderGuard => header_guard::CODE,
        }
    }

    /// Looks up a rule by name or code, ignoring ASCII case.
    #[must_use]
    pub fn from_name_or_code(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(id) || r.code().eq_ignore_ascii_case(id))
    }

    /// Builds the rule with options from `config`.
    #[must_use]
    pub fn build(self, config: &Config, severity: Option<Severity>) -> RuleBox {
        let rule_config = config.rule_config(self.name());
        match self {
            Self::NamingCasing => {
                let mut rule = NamingCasing::new();
                if let Some(rc) = rule_config {
                    rule = rule.allow_names(rc.allow_names.iter().cloned());
                }
                Box::new(with_severity(rule, severity, NamingCasing::severity))
            }
            Self::NoOwningRawPointer => Box::new(with_severity(
                NoOwningRawPointer::new(),
                severity,
                NoOwningRawPointer::severity,
            )),
            Self::NoCStyleCast => {
                let allow_void =
                    rule_config.map_or(true, |rc| rc.get_bool("allow_void_discard", true));
                Box::new(with_severity(
                    NoCStyleCast::new().allow_void_discard(allow_void),
                    severity,
                    NoCStyleCast::severity,
                ))
            }
            Self::UnscopedEnum => Box::new(with_severity(
                UnscopedEnum::new(),
                severity,
                UnscopedEnum::severity,
            )),
            Self::LongParameterList => {
                let default = i64::try_from(config.parameter_count_threshold).unwrap_or(i64::MAX);
                let threshold = rule_config.map_or(default, |rc| rc.get_int("threshold", default));
                let threshold = usize::try_from(threshold).unwrap_or(0);
                Box::new(with_severity(
                    LongParameterList::new().threshold(threshold),
                    severity,
                    LongParameterList::severity,
                ))
            }
            Self::AdjacentSameTypeParameters => Box::new(with_severity(
                AdjacentSameTypeParameters::new(),
                severity,
                AdjacentSameTypeParameters::severity,
            )),
            Self::HeaderGuard => Box::new(with_severity(
                HeaderGuard::new(),
                severity,
                HeaderGuard::severity,
            )),
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn with_severity<R>(rule: R, severity: Option<Severity>, set: fn(R, Severity) -> R) -> R {
    match severity {
        Some(severity) => set(rule, severity),
        None => rule,
    }
}

/// Rewrites `[rules.*]` keys given as codes (or in another case) to rule
/// names, so later lookups by name find them.
///
/// Unknown keys are left untouched.
pub fn normalize_rule_keys(config: &mut Config) {
    let rules = std::mem::take(&mut config.rules);
    config.rules = rules
        .into_iter()
        .map(|(key, value)| match RuleId::from_name_or_code(&key) {
            Some(id) => (id.name().to_string(), value),
            None => (key, value),
        })
        .collect::<BTreeMap<_, _>>();
}

/// Configuration keys under `[rules.*]` that name no built-in rule, as
/// `config` engine notes.
#[must_use]
pub fn unknown_rule_notes(config: &Config) -> Vec<Violation> {
    let known: Vec<&str> = RuleId::ALL.iter().map(|r| r.name()).collect();
    let file = config
        .source
        .clone()
        .unwrap_or_else(|| PathBuf::from("cxxlint.toml"));
    config
        .unknown_rules(&known)
        .into_iter()
        .map(|name| {
            warn!("Unknown rule `{}` in configuration", name);
            EngineNote::Config.violation(
                Severity::Warning,
                Location::new(file.clone(), 1, 1),
                format!("unknown rule `{name}` in configuration"),
            )
        })
        .collect()
}

/// Resolves a `--rules` style filter to rule ids.
///
/// # Errors
///
/// Returns an error naming the first identifier that matches no rule.
pub fn parse_filter<S: AsRef<str>>(ids: &[S]) -> Result<Vec<RuleId>, ConfigError> {
    ids.iter()
        .map(|id| {
            RuleId::from_name_or_code(id.as_ref()).ok_or_else(|| ConfigError::InvalidValue {
                key: "rules".to_string(),
                message: format!("unknown rule `{}`", id.as_ref()),
            })
        })
        .collect()
}

/// Selects and builds the rules for a run.
///
/// The preset's rules are combined with rules explicitly enabled under
/// `[rules.*]`; rules disabled there are dropped. A non-empty `filter`
/// restricts the result to the listed rules.
///
/// # Errors
///
/// Returns an error for an unknown preset name.
pub fn build_rules(config: &Config, filter: &[RuleId]) -> Result<Vec<RuleBox>, ConfigError> {
    let preset = match config.preset.as_deref() {
        Some(name) => Preset::from_name(name).ok_or_else(|| ConfigError::UnknownPreset {
            name: name.to_string(),
            expected: Preset::ALL.map(Preset::name).join(", "),
        })?,
        None => Preset::Recommended,
    };

    let selected: Vec<RuleId> = RuleId::ALL
        .into_iter()
        .filter(|id| {
            let explicit = config.rule_config(id.name()).and_then(|rc| rc.enabled);
            explicit.unwrap_or_else(|| preset.includes(*id))
        })
        .filter(|id| filter.is_empty() || filter.contains(id))
        .collect();

    debug!(
        "Preset `{}` selects {} rule(s): {:?}",
        preset.name(),
        selected.len(),
        selected.iter().map(|r| r.name()).collect::<Vec<_>>()
    );

    Ok(selected
        .into_iter()
        .map(|id| id.build(config, preset.severity_for(id)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(rules: &[RuleBox]) -> Vec<&'static str> {
        rules.iter().map(|r| r.name()).collect()
    }

    #[test]
    fn test_lookup_by_name_or_code() {
        assert_eq!(RuleId::from_name_or_code("naming-casing"), Some(RuleId::NamingCasing));
        assert_eq!(RuleId::from_name_or_code("cx004"), Some(RuleId::UnscopedEnum));
        assert_eq!(RuleId::from_name_or_code("Header-Guard"), Some(RuleId::HeaderGuard));
        assert_eq!(RuleId::from_name_or_code("no-such-rule"), None);
    }

    #[test]
    fn test_ids_are_unique() {
        for (i, a) in RuleId::ALL.iter().enumerate() {
            for b in &RuleId::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_built_rule_matches_id() {
        let config = Config::default();
        for id in RuleId::ALL {
            let rule = id.build(&config, None);
            assert_eq!(rule.name(), id.name());
            assert_eq!(rule.code(), id.code());
        }
    }

    #[test]
    fn test_default_preset_is_recommended() {
        let rules = build_rules(&Config::default(), &[]).expect("rules");
        let names = names(&rules);
        assert_eq!(names.len(), 6);
        assert!(!names.contains(&"adjacent-same-type-parameters"));
    }

    #[test]
    fn test_strict_raises_severity() {
        let config = Config::parse("preset = \"strict\"").expect("config");
        let rules = build_rules(&config, &[]).expect("rules");
        assert_eq!(rules.len(), 7);
        let raw = rules
            .iter()
            .find(|r| r.name() == "no-owning-raw-pointer")
            .expect("raw pointer rule");
        assert_eq!(raw.default_severity(), Severity::Error);
    }

    #[test]
    fn test_explicit_enable_and_disable() {
        let config = Config::parse(
            r#"
preset = "minimal"

[rules.CX006]
enabled = true

[rules.naming-casing]
enabled = false
"#,
        )
        .expect("config");
        let mut config = config;
        normalize_rule_keys(&mut config);
        let rules = build_rules(&config, &[]).expect("rules");
        assert_eq!(names(&rules), vec!["adjacent-same-type-parameters"]);
    }

    #[test]
    fn test_filter_restricts_rules() {
        let filter = parse_filter(&["CX005", "header-guard"]).expect("filter");
        let rules = build_rules(&Config::default(), &filter).expect("rules");
        assert_eq!(names(&rules), vec!["long-parameter-list", "header-guard"]);
        assert!(parse_filter(&["bogus"]).is_err());
    }

    #[test]
    fn test_unknown_preset() {
        let config = Config::parse("preset = \"paranoid\"").expect("config");
        let err = build_rules(&config, &[]).err().expect("unknown preset");
        assert!(matches!(err, ConfigError::UnknownPreset { .. }));
    }

    #[test]
    fn test_unknown_rules_become_notes() {
        let mut config = Config::parse("[rules.cx001]\n[rules.no-goto]\n").expect("config");
        normalize_rule_keys(&mut config);
        let notes = unknown_rule_notes(&config);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].code, "CX904");
        assert!(notes[0].message.contains("no-goto"));
    }
}
