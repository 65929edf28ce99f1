//! # Lifecycle
//!
//! Lifecycle orchestration for plugin-based hosts.
//!
//! Given a catalog of components and services, a stack of requirement
//! layers and the set of running components, this crate computes the
//! minimal-churn set of start/stop/exclude actions that satisfies every hard
//! constraint, hands it to a host for execution, and re-converges when
//! execution itself changes the requirements.
//!
//! ## Core Concepts
//!
//! - **Severity**: how strongly a subject wants to exist and run
//! - **RequirementLayer**: a reference-counted bundle of severity overrides
//! - **RequirementAggregator**: merges baseline and layers into final
//!   severities and tracks what is dirty
//! - **solve**: exhaustive, pruned search for the cheapest feasible plan
//! - **ExecutionPlan**: start/stop/exclude sets, or `Impossible`
//! - **Reconciler**: the apply loop
//!
//! ## Example
//!
//! ```no_run
//! use lifecycle::{
//!     Catalog, Component, NoopHost, Reconciler, RequirementAggregator, RequirementLayer,
//!     Requirements, ScopedConfig, Service, Severity,
//! };
//!
//! let catalog = Catalog::new()
//!     .with_service(Service::new("editor"))
//!     .with_component(Component::new("vim").implements("editor"))
//!     .with_component(Component::new("emacs").implements("editor"));
//!
//! let aggregator = RequirementAggregator::new(catalog, Box::new(ScopedConfig::default()));
//! let reconciler = Reconciler::new(Requirements::new(aggregator), NoopHost);
//!
//! reconciler.requirements().add_layer(
//!     RequirementLayer::new("session").with_service("editor", Severity::Mandatory),
//!     false,
//! );
//! let report = reconciler.apply(false)?;
//! assert_eq!(report.started, 1);
//! # Ok::<(), lifecycle::Error>(())
//! ```
//!
//! ## Provider Traits
//!
//! - [`Host`]: executes plans
//! - [`SeverityResolver`]: supplies baseline severities
//! - [`LifecycleObserver`]: receives dirty and apply notifications

pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod host;
pub mod layer;
pub mod observer;
pub mod plan;
pub mod reconciler;
pub mod resolver;
pub mod severity;
pub mod snapshot;
pub mod solver;

// Re-export main types at crate root
pub use aggregator::{RequirementAggregator, Requirements};
pub use catalog::{Catalog, Component, ComponentId, Dependency, Service, ServiceId, Subject};
pub use error::{Error, Result};
pub use host::{ExecuteContext, ExecutionFailure, Host, HostResult, NoopHost};
pub use layer::RequirementLayer;
pub use observer::LifecycleObserver;
pub use plan::{ExecutionPlan, PlanSteps, PlanSummary};
pub use reconciler::{ApplyReport, Reconciler};
pub use resolver::{NoBaseline, ScopeTable, ScopedConfig, SeverityResolver};
pub use severity::Severity;
pub use snapshot::Snapshot;
pub use solver::{PENALTY, SolverOptions, solve};
