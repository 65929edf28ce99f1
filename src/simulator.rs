use crate::schema::Trigger;
use colored::Colorize;
use lifecycle::{ComponentId, ExecuteContext, ExecutionFailure, Host, HostResult, PlanSteps};
use std::collections::BTreeSet;

/// A recorded host action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Exclude(ComponentId),
    Stop(ComponentId),
    Start(ComponentId),
}

/// Host that pretends to run plugins
///
/// Starting a component pushes the layers its triggers name; stopping or
/// excluding it takes them away again. Components listed in `fail` refuse
/// to start.
pub struct SimulatedHost {
    triggers: Vec<Trigger>,
    fail: BTreeSet<ComponentId>,
    actions: Vec<Action>,
    echo: bool,
}

impl SimulatedHost {
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self {
            triggers,
            fail: BTreeSet::new(),
            actions: Vec::new(),
            echo: false,
        }
    }

    pub fn failing(mut self, ids: impl IntoIterator<Item = ComponentId>) -> Self {
        self.fail.extend(ids);
        self
    }

    /// Print every action as it happens
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    fn record(&mut self, action: Action, pass: usize) {
        if self.echo {
            let (verb, id) = match &action {
                Action::Exclude(id) => ("exclude".red(), id),
                Action::Stop(id) => ("stop".yellow(), id),
                Action::Start(id) => ("start".green(), id),
            };
            println!("  {} {:<8} {}", format!("#{pass}").dimmed(), verb, id);
        }
        self.actions.push(action);
    }

    fn teardown(&self, id: &ComponentId, ctx: &ExecuteContext<'_>) {
        for trigger in self.triggers.iter().filter(|t| &t.component == id) {
            ctx.requirements.remove_layer(&trigger.layer, false);
        }
    }
}

impl Host for SimulatedHost {
    fn execute(&mut self, steps: &PlanSteps, ctx: &ExecuteContext<'_>) -> HostResult {
        for id in steps.exclude() {
            if ctx.requirements.read(|s| s.is_running(id)) {
                self.teardown(id, ctx);
            }
            self.record(Action::Exclude(id.clone()), ctx.pass);
        }

        for id in steps.stop() {
            self.teardown(id, ctx);
            self.record(Action::Stop(id.clone()), ctx.pass);
        }

        // The pass is not committed on failure, so layers pushed by its
        // starts must go away with it
        let mut started = Vec::new();
        for id in steps.start() {
            if self.fail.contains(id) {
                log::debug!("Simulated failure starting {id}");
                for done in &started {
                    self.teardown(done, ctx);
                }
                return Err(ExecutionFailure::new(id.clone(), "simulated start failure"));
            }
            for trigger in self.triggers.iter().filter(|t| &t.component == id) {
                log::debug!("{id} requests layer '{}'", trigger.layer.name);
                ctx.requirements.add_layer(trigger.layer.clone(), true);
            }
            self.record(Action::Start(id.clone()), ctx.pass);
            started.push(id.clone());
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
