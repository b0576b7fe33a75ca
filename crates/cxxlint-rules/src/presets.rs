//! Rule presets for common configurations.

use crate::registry::RuleId;
use cxxlint_core::{Config, RuleBox, Severity};

/// Preset configurations for cxxlint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Recommended rules with sensible defaults.
    Recommended,
    /// Every rule, with ownership and naming findings as errors.
    Strict,
    /// Naming only, for gradual adoption.
    Minimal,
}

impl Preset {
    /// Every preset.
    pub const ALL: [Self; 3] = [Self::Recommended, Self::Strict, Self::Minimal];

    /// Name used in configuration files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Strict => "strict",
            Self::Minimal => "minimal",
        }
    }

    /// Looks up a preset by name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Returns true if the preset enables `id`.
    #[must_use]
    pub fn includes(self, id: RuleId) -> bool {
        match self {
            Self::Recommended => id != RuleId::AdjacentSameTypeParameters,
            Self::Strict => true,
            Self::Minimal => id == RuleId::NamingCasing,
        }
    }

    /// Severity the preset assigns to `id`, when it differs from the rule's
    /// default.
    #[must_use]
    pub fn severity_for(self, id: RuleId) -> Option<Severity> {
        match (self, id) {
            (Self::Strict, RuleId::NamingCasing | RuleId::NoOwningRawPointer) => {
                Some(Severity::Error)
            }
            _ => None,
        }
    }

    /// Returns the rules for this preset with default options.
    #[must_use]
    pub fn rules(self) -> Vec<RuleBox> {
        let config = Config::default();
        RuleId::ALL
            .into_iter()
            .filter(|id| self.includes(*id))
            .map(|id| id.build(&config, self.severity_for(id)))
            .collect()
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown preset `{s}`"))
    }
}

/// Returns the recommended set of rules.
///
/// Includes every rule except `adjacent-same-type-parameters` (CX006),
/// which is informational and noisy on legacy code.
#[must_use]
pub fn recommended_rules() -> Vec<RuleBox> {
    Preset::Recommended.rules()
}

/// Returns the strict set of rules.
///
/// Includes all rules, with `naming-casing` (CX001) and
/// `no-owning-raw-pointer` (CX002) at error severity.
#[must_use]
pub fn strict_rules() -> Vec<RuleBox> {
    Preset::Strict.rules()
}

/// Returns the minimal set of rules.
///
/// For gradual adoption, only includes `naming-casing` (CX001).
#[must_use]
pub fn minimal_rules() -> Vec<RuleBox> {
    Preset::Minimal.rules()
}

/// Returns all available rules at their default settings.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    let config = Config::default();
    RuleId::ALL
        .into_iter()
        .map(|id| id.build(&config, None))
        .collect()
}
