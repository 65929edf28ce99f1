//! Reconciler - solves, executes and re-converges until requirements settle

use crate::aggregator::Requirements;
use crate::error::{Error, Result};
use crate::host::{ExecuteContext, Host};
use crate::observer::LifecycleObserver;
use crate::plan::{ExecutionPlan, PlanSteps};
use crate::solver::{self, SolverOptions};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Summary of a successful apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Solve/execute passes run; 0 when there was nothing to do
    pub passes: usize,
    pub started: usize,
    pub stopped: usize,
    pub excluded: usize,
    /// Cost of the last executed plan
    pub cost: u32,
}

impl ApplyReport {
    fn record(&mut self, steps: &PlanSteps) {
        self.started += steps.start().len();
        self.stopped += steps.stop().len();
        self.excluded = steps.exclude().len();
        self.cost = steps.cost();
    }

    /// Total running-state transitions across all passes
    pub fn transitions(&self) -> usize {
        self.started + self.stopped
    }
}

/// Drives the running system toward the aggregated requirements
pub struct Reconciler<H: Host> {
    requirements: Requirements,
    host: Mutex<H>,
    options: SolverOptions,
    applying: AtomicBool,
}

impl<H: Host> Reconciler<H> {
    pub fn new(requirements: Requirements, host: H) -> Self {
        Self {
            requirements,
            host: Mutex::new(host),
            options: SolverOptions::default(),
            applying: AtomicBool::new(false),
        }
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    pub fn is_dirty(&self) -> bool {
        self.requirements.is_dirty()
    }

    pub fn subscribe(&self, observer: Arc<dyn LifecycleObserver>) {
        self.requirements.subscribe(observer);
    }

    /// Borrow the host between applies
    pub fn with_host<T>(&self, f: impl FnOnce(&mut H) -> T) -> T {
        f(&mut self.host.lock())
    }

    /// Solve against the current requirements without executing anything
    pub fn plan(&self, stop_eager_running: bool) -> Result<ExecutionPlan> {
        solver::solve(
            &self.requirements.snapshot(),
            stop_eager_running,
            &self.options,
        )
    }

    /// Bring the running system in line with the requirements
    ///
    /// Returns immediately when nothing is dirty. Otherwise solves and
    /// executes passes until a pass completes without the requirements
    /// changing underneath it. An impossible plan or a failing host stops
    /// the loop; the running baseline only moves on successful passes.
    ///
    /// # Panics
    ///
    /// Panics if another `apply` on this reconciler is still in flight,
    /// including a reentrant call from the host.
    pub fn apply(&self, stop_eager_running: bool) -> Result<ApplyReport> {
        let _guard = ApplyGuard::enter(&self.applying);

        if !self.requirements.is_dirty() {
            log::debug!("Nothing to apply");
            return Ok(ApplyReport::default());
        }

        let result = self.converge(stop_eager_running);
        match &result {
            Ok(report) => log::info!(
                "Applied in {} pass(es): {} started, {} stopped, {} excluded",
                report.passes,
                report.started,
                report.stopped,
                report.excluded
            ),
            Err(e) => log::warn!("Apply failed: {e}"),
        }

        for observer in self.requirements.observers() {
            observer.on_apply_complete(&result);
        }
        result
    }

    /// [`apply`](Self::apply) reduced to success or failure
    pub fn apply_ok(&self, stop_eager_running: bool) -> bool {
        self.apply(stop_eager_running).is_ok()
    }

    fn converge(&self, stop_eager_running: bool) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        loop {
            report.passes += 1;
            let snapshot = self.requirements.mutate(|s| s.begin_pass());

            let steps = match solver::solve(&snapshot, stop_eager_running, &self.options)
                .and_then(ExecutionPlan::into_steps)
            {
                Ok(steps) => steps,
                Err(e) => {
                    self.requirements.mutate(|s| s.end_pass());
                    return Err(e);
                }
            };

            log::debug!(
                "Pass {}: start {:?}, stop {:?}, exclude {:?}",
                report.passes,
                steps.start(),
                steps.stop(),
                steps.exclude()
            );

            let outcome = {
                let ctx = ExecuteContext {
                    pass: report.passes,
                    requirements: &self.requirements,
                };
                self.host.lock().execute(&steps, &ctx)
            };

            if let Err(failure) = outcome {
                self.requirements.mutate(|s| {
                    s.end_pass();
                    s.record_failure(&failure.culprit, failure.message.clone());
                });
                return Err(Error::ExecutionFailed {
                    culprit: failure.culprit,
                    message: failure.message,
                });
            }

            let reapply = self.requirements.mutate(|s| {
                s.commit(&snapshot, &steps);
                s.end_pass()
            });
            report.record(&steps);

            if !reapply {
                return Ok(report);
            }
            log::debug!(
                "Requirements changed during pass {}, reapplying",
                report.passes
            );
        }
    }
}

/// Single-flight marker for [`Reconciler::apply`]
struct ApplyGuard<'a>(&'a AtomicBool);

impl<'a> ApplyGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        let busy = flag.swap(true, Ordering::AcqRel);
        assert!(!busy, "Reconciler::apply called while another apply is in flight");
        Self(flag)
    }
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
