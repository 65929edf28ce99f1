use anyhow::{Context, Result, bail};
use lifecycle::{
    Catalog, Component, ComponentId, RequirementAggregator, RequirementLayer, ScopedConfig,
    Service, SolverOptions,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Scenario Schema
// ============================================================================

/// A scenario file: catalog, configuration, layers and running set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Force every component and service to `excluded`
    #[serde(default)]
    pub disabled: bool,

    /// Components that are running before the first apply
    #[serde(default)]
    pub running: Vec<ComponentId>,

    #[serde(default)]
    pub services: Vec<Service>,

    #[serde(default)]
    pub components: Vec<Component>,

    /// System, user and session severities
    #[serde(default)]
    pub config: ScopedConfig,

    /// Requirement layers active before the first apply
    #[serde(default)]
    pub layers: Vec<RequirementLayer>,

    /// Layers a component pushes while it runs
    #[serde(default)]
    pub triggers: Vec<Trigger>,

    #[serde(default)]
    pub solver: SolverOptions,
}

/// A layer added when `component` starts and removed when it stops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub component: ComponentId,
    pub layer: RequirementLayer,
}

impl Scenario {
    /// Build the catalog; services only referenced by components are added
    /// implicitly
    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        for service in &self.services {
            catalog
                .add_service(service.clone())
                .context("Duplicate service entry")?;
        }
        for component in &self.components {
            let referenced = component
                .implements
                .iter()
                .chain(component.dependencies.iter().map(|d| &d.service));
            for service in referenced {
                if catalog.service(service).is_none() {
                    catalog.insert_service(Service::new(service.clone()));
                }
            }
            catalog
                .add_component(component.clone())
                .context("Duplicate component entry")?;
        }
        Ok(catalog)
    }

    /// Aggregator with configuration, layers and running flags applied
    pub fn aggregator(&self) -> Result<RequirementAggregator> {
        let mut aggregator =
            RequirementAggregator::new(self.catalog()?, Box::new(self.config.clone()));
        aggregator.set_globally_disabled(self.disabled);
        for layer in &self.layers {
            aggregator.add_layer(layer.clone(), true);
        }
        for id in &self.running {
            aggregator.mark_running(id, true);
        }
        Ok(aggregator)
    }

    /// Reject scenarios whose references do not resolve
    pub fn validate(&self) -> Result<()> {
        let catalog = self.catalog()?;
        for id in &self.running {
            catalog
                .require_component(id)
                .context("Running set refers to a missing component")?;
        }
        for trigger in &self.triggers {
            catalog
                .require_component(&trigger.component)
                .with_context(|| format!("Invalid trigger '{}'", trigger.layer.name))?;
        }

        let layers = self
            .layers
            .iter()
            .chain(self.triggers.iter().map(|t| &t.layer));
        for layer in layers {
            check_layer(layer, &catalog)
                .with_context(|| format!("Invalid layer '{}'", layer.name))?;
        }

        catalog.validate().context("Catalog is inconsistent")?;
        Ok(())
    }
}

fn check_layer(layer: &RequirementLayer, catalog: &Catalog) -> Result<()> {
    if layer.name.trim().is_empty() {
        bail!("Layer name cannot be empty");
    }
    if let Some(subject) = layer.subjects().find(|s| !catalog.contains(s)) {
        bail!("Unknown {subject}");
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
