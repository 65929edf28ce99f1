//! Component and service catalog
//!
//! The catalog is supplied by discovery and never mutated by the
//! orchestrator. It only describes what exists; whether something runs is
//! decided by the solver.

use crate::error::{Error, Result};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier of a component (plugin)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Unique identifier of a service (contract name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Anything that carries a final severity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Component(ComponentId),
    Service(ServiceId),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component(id) => write!(f, "component:{id}"),
            Self::Service(id) => write!(f, "service:{id}"),
        }
    }
}

/// A dependency edge from a component to a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub service: ServiceId,
    #[serde(default)]
    pub level: Severity,
}

impl Dependency {
    pub fn new(service: impl Into<ServiceId>, level: Severity) -> Self {
        Self {
            service: service.into(),
            level,
        }
    }
}

/// A schedulable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    #[serde(default)]
    pub version: String,
    /// The single service this component implements, if any
    #[serde(default)]
    pub implements: Option<ServiceId>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Discovery-time error; forces the component to `Excluded`
    #[serde(default)]
    pub error: Option<String>,
}

impl Component {
    pub fn new(id: impl Into<ComponentId>) -> Self {
        Self {
            id: id.into(),
            version: String::new(),
            implements: None,
            dependencies: Vec::new(),
            error: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn implements(mut self, service: impl Into<ServiceId>) -> Self {
        self.implements = Some(service.into());
        self
    }

    pub fn depends_on(mut self, service: impl Into<ServiceId>, level: Severity) -> Self {
        self.dependencies.push(Dependency::new(service, level));
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// A component that implements nothing and depends on nothing cannot
    /// influence anyone else's feasibility
    pub fn is_independent(&self) -> bool {
        self.implements.is_none() && self.dependencies.is_empty()
    }

    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// A named capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    /// Not governed by this orchestrator; always counts as running
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl Service {
    pub fn new(id: impl Into<ServiceId>) -> Self {
        Self {
            id: id.into(),
            external: false,
            error: None,
        }
    }

    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// The immutable set of known components and services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    components: BTreeMap<ComponentId, Component>,
    services: BTreeMap<ServiceId, Service>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component, replacing any previous one with the same id
    pub fn with_component(mut self, component: Component) -> Self {
        self.insert_component(component);
        self
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.insert_service(service);
        self
    }

    pub fn insert_component(&mut self, component: Component) {
        self.components.insert(component.id.clone(), component);
    }

    pub fn insert_service(&mut self, service: Service) {
        self.services.insert(service.id.clone(), service);
    }

    /// Add a component discovered once; a second one with the same id is
    /// rejected
    pub fn add_component(&mut self, component: Component) -> Result<()> {
        if self.components.contains_key(&component.id) {
            return Err(Error::DuplicateComponent(component.id));
        }
        self.insert_component(component);
        Ok(())
    }

    pub fn add_service(&mut self, service: Service) -> Result<()> {
        if self.services.contains_key(&service.id) {
            return Err(Error::DuplicateService(service.id));
        }
        self.insert_service(service);
        Ok(())
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Like [`component`](Self::component), failing on unknown ids
    pub fn require_component(&self, id: &ComponentId) -> Result<&Component> {
        self.component(id)
            .ok_or_else(|| Error::UnknownComponent(id.clone()))
    }

    pub fn service(&self, id: &ServiceId) -> Option<&Service> {
        self.services.get(id)
    }

    /// Components in id order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Services in id order
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    /// Components implementing `service`, in id order
    pub fn implementations<'a>(
        &'a self,
        service: &'a ServiceId,
    ) -> impl Iterator<Item = &'a Component> + 'a {
        self.components
            .values()
            .filter(move |c| c.implements.as_ref() == Some(service))
    }

    /// Every subject that carries a severity
    pub fn subjects(&self) -> impl Iterator<Item = Subject> + '_ {
        self.components
            .keys()
            .cloned()
            .map(Subject::Component)
            .chain(self.services.keys().cloned().map(Subject::Service))
    }

    /// Whether discovery flagged the subject (or it is not in the catalog)
    pub fn is_unavailable(&self, subject: &Subject) -> bool {
        match subject {
            Subject::Component(id) => self.component(id).is_none_or(|c| !c.is_available()),
            Subject::Service(id) => self.service(id).is_none_or(|s| !s.is_available()),
        }
    }

    pub fn contains(&self, subject: &Subject) -> bool {
        match subject {
            Subject::Component(id) => self.components.contains_key(id),
            Subject::Service(id) => self.services.contains_key(id),
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Check the discovery contract: every referenced service must exist
    pub fn validate(&self) -> Result<()> {
        for component in self.components.values() {
            let referenced = component
                .implements
                .iter()
                .chain(component.dependencies.iter().map(|d| &d.service));
            for service in referenced {
                if !self.services.contains_key(service) {
                    return Err(Error::UnknownService(service.clone()));
                }
            }
        }
        Ok(())
    }

    /// Services no component implements; edges to them are never satisfied
    pub fn unimplemented_services(&self) -> BTreeSet<&ServiceId> {
        let implemented: BTreeSet<&ServiceId> = self
            .components
            .values()
            .filter_map(|c| c.implements.as_ref())
            .collect();
        self.services
            .keys()
            .filter(|id| !implemented.contains(id))
            .collect()
    }
}
