//! Severity ladder - how strongly something wants to exist and run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requirement level for a component, a service or a dependency edge
///
/// Variants are declared in ascending pressure-to-run. `Excluded` sorts
/// last so that merging by `max` lets it veto every other level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No preference
    #[default]
    Passive,
    /// Must be available, running not demanded
    Present,
    /// Must be available, running preferred
    EagerPresent,
    /// Availability not required, running preferred if available
    EagerPassive,
    /// Must be available and running
    Mandatory,
    /// Must not run under any circumstance
    Excluded,
}

impl Severity {
    /// All levels, in ladder order
    pub const ALL: [Self; 6] = [
        Self::Passive,
        Self::Present,
        Self::EagerPresent,
        Self::EagerPassive,
        Self::Mandatory,
        Self::Excluded,
    ];

    /// Merge two contributions; `Excluded` wins over everything
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Check if this level vetoes running
    pub fn is_excluded(self) -> bool {
        self == Self::Excluded
    }

    /// Check if running is preferred (`EagerPresent` or `EagerPassive`)
    pub fn is_eager(self) -> bool {
        matches!(self, Self::EagerPresent | Self::EagerPassive)
    }

    /// Check if this level carries no demand to run (`Passive` or `Present`)
    pub fn is_lazy(self) -> bool {
        matches!(self, Self::Passive | Self::Present)
    }

    /// Snake-case name, as used in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passive => "passive",
            Self::Present => "present",
            Self::EagerPresent => "eager_present",
            Self::EagerPassive => "eager_passive",
            Self::Mandatory => "mandatory",
            Self::Excluded => "excluded",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| format!("unknown severity '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_order() {
        assert!(Severity::Passive < Severity::Present);
        assert!(Severity::Present < Severity::EagerPresent);
        assert!(Severity::EagerPresent < Severity::EagerPassive);
        assert!(Severity::EagerPassive < Severity::Mandatory);
    }

    #[test]
    fn test_excluded_vetoes_merge() {
        assert_eq!(
            Severity::Mandatory.merge(Severity::Excluded),
            Severity::Excluded
        );
        assert_eq!(
            Severity::Excluded.merge(Severity::Passive),
            Severity::Excluded
        );
        assert_eq!(
            Severity::Present.merge(Severity::EagerPassive),
            Severity::EagerPassive
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("mandatory".parse::<Severity>(), Ok(Severity::Mandatory));
        assert_eq!(
            "Eager-Present".parse::<Severity>(),
            Ok(Severity::EagerPresent)
        );
        assert!("sometimes".parse::<Severity>().is_err());
    }

    #[test]
    fn test_default_is_passive() {
        assert_eq!(Severity::default(), Severity::Passive);
    }
}
