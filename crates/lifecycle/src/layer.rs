//! Requirement layers - named bundles of severity overrides

use crate::catalog::{ComponentId, ServiceId, Subject};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named set of per-component and per-service severity overrides
///
/// Layers are compared by value: two layers with the same name and the
/// same entries are the same layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementLayer {
    pub name: String,
    #[serde(default)]
    pub components: BTreeMap<ComponentId, Severity>,
    #[serde(default)]
    pub services: BTreeMap<ServiceId, Severity>,
}

impl RequirementLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_component(mut self, id: impl Into<ComponentId>, severity: Severity) -> Self {
        self.components.insert(id.into(), severity);
        self
    }

    pub fn with_service(mut self, id: impl Into<ServiceId>, severity: Severity) -> Self {
        self.services.insert(id.into(), severity);
        self
    }

    /// The override this layer contributes for `subject`, if any
    pub fn severity_for(&self, subject: &Subject) -> Option<Severity> {
        match subject {
            Subject::Component(id) => self.components.get(id).copied(),
            Subject::Service(id) => self.services.get(id).copied(),
        }
    }

    /// Every subject this layer mentions
    pub fn subjects(&self) -> impl Iterator<Item = Subject> + '_ {
        self.components
            .keys()
            .cloned()
            .map(Subject::Component)
            .chain(self.services.keys().cloned().map(Subject::Service))
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_for() {
        let layer = RequirementLayer::new("debugging")
            .with_component("debugger", Severity::Mandatory)
            .with_service("symbols", Severity::Present);

        assert_eq!(
            layer.severity_for(&Subject::Component("debugger".into())),
            Some(Severity::Mandatory)
        );
        assert_eq!(
            layer.severity_for(&Subject::Service("symbols".into())),
            Some(Severity::Present)
        );
        assert_eq!(
            layer.severity_for(&Subject::Component("symbols".into())),
            None
        );
    }

    #[test]
    fn test_value_identity() {
        let a = RequirementLayer::new("x").with_component("c", Severity::Present);
        let b = RequirementLayer::new("x").with_component("c", Severity::Present);
        let c = RequirementLayer::new("x").with_component("c", Severity::Mandatory);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_subjects() {
        let layer = RequirementLayer::new("x")
            .with_component("c", Severity::Present)
            .with_service("s", Severity::Passive);
        let subjects: Vec<Subject> = layer.subjects().collect();
        assert_eq!(
            subjects,
            vec![
                Subject::Component("c".into()),
                Subject::Service("s".into())
            ]
        );
    }
}
