//! Execution plan - what the host must start, stop and exclude

use crate::catalog::ComponentId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Result of solving: either concrete steps or `Impossible`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionPlan {
    /// No assignment satisfies the hard constraints; nothing may execute
    Impossible,
    /// A feasible, cost-minimal set of actions
    Ready(PlanSteps),
}

impl ExecutionPlan {
    pub fn is_impossible(&self) -> bool {
        matches!(self, Self::Impossible)
    }

    pub fn steps(&self) -> Option<&PlanSteps> {
        match self {
            Self::Impossible => None,
            Self::Ready(steps) => Some(steps),
        }
    }

    /// Cost of the chosen assignment; `None` when impossible
    pub fn cost(&self) -> Option<u32> {
        self.steps().map(PlanSteps::cost)
    }

    pub fn summary(&self) -> Option<PlanSummary> {
        self.steps().map(PlanSteps::summary)
    }

    /// Take the steps, turning `Impossible` into [`Error::Impossible`]
    pub fn into_steps(self) -> Result<PlanSteps> {
        match self {
            Self::Impossible => Err(Error::Impossible),
            Self::Ready(steps) => Ok(steps),
        }
    }
}

/// Three disjoint component sets plus the cost of the chosen assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSteps {
    start: BTreeSet<ComponentId>,
    stop: BTreeSet<ComponentId>,
    exclude: BTreeSet<ComponentId>,
    cost: u32,
}

impl PlanSteps {
    /// Build steps from the three sets
    ///
    /// A component listed in `exclude` is dropped from `start` and `stop`,
    /// and one listed in both `start` and `stop` is dropped from `stop`.
    pub fn new(
        start: BTreeSet<ComponentId>,
        stop: BTreeSet<ComponentId>,
        exclude: BTreeSet<ComponentId>,
        cost: u32,
    ) -> Self {
        let start: BTreeSet<ComponentId> = start.difference(&exclude).cloned().collect();
        let stop = stop
            .into_iter()
            .filter(|id| !exclude.contains(id) && !start.contains(id))
            .collect();
        Self {
            start,
            stop,
            exclude,
            cost,
        }
    }

    /// Components to start (not running before, running after)
    pub fn start(&self) -> &BTreeSet<ComponentId> {
        &self.start
    }

    /// Components to stop (running before, not running after)
    pub fn stop(&self) -> &BTreeSet<ComponentId> {
        &self.stop
    }

    /// Components that must not run at all
    pub fn exclude(&self) -> &BTreeSet<ComponentId> {
        &self.exclude
    }

    /// Total cost of the chosen assignment
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// No component changes its running state
    pub fn is_noop(&self) -> bool {
        self.start.is_empty() && self.stop.is_empty()
    }

    /// Whether `id` runs once the plan has executed, given it ran before
    pub fn runs_after(&self, id: &ComponentId, was_running: bool) -> bool {
        if self.exclude.contains(id) || self.stop.contains(id) {
            false
        } else {
            was_running || self.start.contains(id)
        }
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            starts: self.start.len(),
            stops: self.stop.len(),
            exclusions: self.exclude.len(),
            cost: self.cost,
        }
    }
}

/// Plan summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub starts: usize,
    pub stops: usize,
    pub exclusions: usize,
    pub cost: u32,
}

impl PlanSummary {
    /// Number of running-state transitions
    pub fn transitions(&self) -> usize {
        self.starts + self.stops
    }

    pub fn has_changes(&self) -> bool {
        self.transitions() > 0
    }
}
