//! Immutable view of final severities and running flags
//!
//! The reconciler solves against a snapshot so that layer changes made
//! while a plan executes cannot tear the plan.

use crate::catalog::{Catalog, ComponentId, ServiceId, Subject};
use crate::severity::Severity;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Solver input: catalog, final severities and currently running components
#[derive(Debug, Clone)]
pub struct Snapshot {
    catalog: Arc<Catalog>,
    severities: BTreeMap<Subject, Severity>,
    running: BTreeSet<ComponentId>,
}

impl Snapshot {
    /// Empty snapshot over `catalog`; every subject starts `Passive`
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            severities: BTreeMap::new(),
            running: BTreeSet::new(),
        }
    }

    pub(crate) fn from_parts(
        catalog: Arc<Catalog>,
        severities: BTreeMap<Subject, Severity>,
        running: BTreeSet<ComponentId>,
    ) -> Self {
        Self {
            catalog,
            severities,
            running,
        }
    }

    pub fn with_component(mut self, id: impl Into<ComponentId>, severity: Severity) -> Self {
        self.severities
            .insert(Subject::Component(id.into()), severity);
        self
    }

    pub fn with_service(mut self, id: impl Into<ServiceId>, severity: Severity) -> Self {
        self.severities.insert(Subject::Service(id.into()), severity);
        self
    }

    pub fn with_running(mut self, id: impl Into<ComponentId>) -> Self {
        self.running.insert(id.into());
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn severity(&self, subject: &Subject) -> Severity {
        self.severities.get(subject).copied().unwrap_or_default()
    }

    pub fn component_severity(&self, id: &ComponentId) -> Severity {
        self.severity(&Subject::Component(id.clone()))
    }

    pub fn service_severity(&self, id: &ServiceId) -> Severity {
        self.severity(&Subject::Service(id.clone()))
    }

    pub fn is_running(&self, id: &ComponentId) -> bool {
        self.running.contains(id)
    }

    pub fn running(&self) -> &BTreeSet<ComponentId> {
        &self.running
    }

    /// Final severities in subject order
    pub fn severities(&self) -> &BTreeMap<Subject, Severity> {
        &self.severities
    }
}
