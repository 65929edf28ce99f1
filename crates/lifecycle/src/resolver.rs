//! Baseline severity resolution
//!
//! The baseline is what persisted configuration says about a subject before
//! any requirement layer is consulted.

use crate::catalog::{ComponentId, ServiceId, Subject};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider of the per-subject baseline severity
///
/// Implement this trait to plug in your configuration store. When its
/// content changes, tell the aggregator via
/// [`Requirements::configuration_changed`](crate::Requirements::configuration_changed).
pub trait SeverityResolver: Send + Sync {
    /// Baseline for `subject`; `Passive` when nothing is configured
    fn baseline(&self, subject: &Subject) -> Severity;
}

/// Resolver with no configuration at all
pub struct NoBaseline;

impl SeverityResolver for NoBaseline {
    fn baseline(&self, _subject: &Subject) -> Severity {
        Severity::Passive
    }
}

/// Severity settings of a single configuration scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeTable {
    #[serde(default)]
    pub components: BTreeMap<ComponentId, Severity>,
    #[serde(default)]
    pub services: BTreeMap<ServiceId, Severity>,
}

impl ScopeTable {
    pub fn get(&self, subject: &Subject) -> Option<Severity> {
        match subject {
            Subject::Component(id) => self.components.get(id).copied(),
            Subject::Service(id) => self.services.get(id).copied(),
        }
    }
}

/// System, user and session configuration
///
/// The most specific scope that mentions a subject wins:
/// session over user over system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedConfig {
    #[serde(default)]
    pub system: ScopeTable,
    #[serde(default)]
    pub user: ScopeTable,
    #[serde(default)]
    pub session: ScopeTable,
}

impl SeverityResolver for ScopedConfig {
    fn baseline(&self, subject: &Subject) -> Severity {
        self.session
            .get(subject)
            .or_else(|| self.user.get(subject))
            .or_else(|| self.system.get(subject))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_specific_scope_wins() {
        let mut config = ScopedConfig::default();
        let git = ComponentId::new("git");
        config.system.components.insert(git.clone(), Severity::Mandatory);
        config.user.components.insert(git.clone(), Severity::Present);

        let subject = Subject::Component(git.clone());
        assert_eq!(config.baseline(&subject), Severity::Present);

        config.session.components.insert(git, Severity::Excluded);
        assert_eq!(config.baseline(&subject), Severity::Excluded);
    }

    #[test]
    fn test_unconfigured_is_passive() {
        let config = ScopedConfig::default();
        assert_eq!(
            config.baseline(&Subject::Service("vcs".into())),
            Severity::Passive
        );
        assert_eq!(
            NoBaseline.baseline(&Subject::Service("vcs".into())),
            Severity::Passive
        );
    }
}
