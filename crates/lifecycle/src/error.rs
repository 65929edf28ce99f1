//! Error types for the lifecycle crate

use crate::catalog::{ComponentId, ServiceId};
use thiserror::Error;

/// Errors that can occur while planning or applying lifecycle changes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No assignment satisfies the hard constraints
    #[error("no feasible execution plan exists for the current requirements")]
    Impossible,

    /// The host failed to start or stop a component
    #[error("component {culprit} failed during execution: {message}")]
    ExecutionFailed {
        culprit: ComponentId,
        message: String,
    },

    /// Too many free components for exhaustive search
    #[error("{free} unresolved components exceed the search limit of {limit}")]
    SearchTooLarge { free: usize, limit: usize },

    /// A component id not present in the catalog
    #[error("unknown component: {0}")]
    UnknownComponent(ComponentId),

    /// A service id not present in the catalog
    #[error("unknown service: {0}")]
    UnknownService(ServiceId),

    /// A component id registered twice
    #[error("duplicate component: {0}")]
    DuplicateComponent(ComponentId),

    /// A service id registered twice
    #[error("duplicate service: {0}")]
    DuplicateService(ServiceId),
}

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, Error>;
