//! Host provider trait
//!
//! The host performs the actual instantiation and teardown. This crate only
//! decides what to do and records what happened.

use crate::aggregator::Requirements;
use crate::catalog::ComponentId;
use crate::plan::PlanSteps;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A failed start or stop, blamed on exactly one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    pub culprit: ComponentId,
    pub message: String,
}

impl ExecutionFailure {
    pub fn new(culprit: impl Into<ComponentId>, message: impl Into<String>) -> Self {
        Self {
            culprit: culprit.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.culprit, self.message)
    }
}

/// Outcome of executing a plan
pub type HostResult = std::result::Result<(), ExecutionFailure>;

/// Context passed to [`Host::execute`]
pub struct ExecuteContext<'a> {
    /// One-based pass number within the current apply
    pub pass: usize,
    /// Requirement handle; started components may add or remove layers
    pub requirements: &'a Requirements,
}

/// Executor of plans
///
/// Implementations should process `exclude`, then `stop`, then `start`.
/// Mutating the requirements from inside `execute` is allowed and makes
/// the reconciler run another pass.
pub trait Host: Send {
    fn execute(&mut self, steps: &PlanSteps, ctx: &ExecuteContext<'_>) -> HostResult;
}

/// Host that accepts every plan without doing anything
pub struct NoopHost;

impl Host for NoopHost {
    fn execute(&mut self, _steps: &PlanSteps, _ctx: &ExecuteContext<'_>) -> HostResult {
        Ok(())
    }
}
