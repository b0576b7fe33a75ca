//! Notes emitted by the engine itself rather than by a rule.
//!
//! Engine notes travel through the same report as rule violations but use
//! reserved `CX9xx` codes and are never suppressed or fixed.

use crate::types::{Location, Severity, Violation};

/// Kinds of engine note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineNote {
    /// A token run the extractor could not recognize.
    UnparsedRegion,
    /// A suppression marker without effect (unmatched end, unterminated region).
    SuppressionMarker,
    /// A rule panicked on this file.
    RuleError,
    /// External formatter difference or failure.
    Formatter,
    /// Configuration problem that does not abort the run.
    Config,
    /// A file could not be read.
    Io,
    /// A fix batch was rejected.
    Fix,
}

impl EngineNote {
    /// Every engine note kind.
    pub const ALL: [Self; 7] = [
        Self::UnparsedRegion,
        Self::SuppressionMarker,
        Self::RuleError,
        Self::Formatter,
        Self::Config,
        Self::Io,
        Self::Fix,
    ];

    /// Reserved code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::UnparsedRegion => "CX900",
            Self::SuppressionMarker => "CX901",
            Self::RuleError => "CX902",
            Self::Formatter => "CX903",
            Self::Config => "CX904",
            Self::Io => "CX905",
            Self::Fix => "CX906",
        }
    }

    /// Name shown in the `rule_id` position.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::UnparsedRegion => "unparsed-region",
            Self::SuppressionMarker => "suppression-marker",
            Self::RuleError => "rule-error",
            Self::Formatter => "formatter",
            Self::Config => "config",
            Self::Io => "io",
            Self::Fix => "fix",
        }
    }

    /// Looks up a note kind by its code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.code() == code)
    }

    /// Builds the note as a violation.
    #[must_use]
    pub fn violation(
        self,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Violation {
        Violation::new(self.code(), self.name(), severity, location, message)
    }
}
