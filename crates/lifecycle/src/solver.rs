//! Plan solver - minimal-churn start/stop assignment under hard constraints
//!
//! Components whose decision is forced are locked up front; the rest are
//! enumerated exhaustively as a bit vector. Bit `j` set means free component
//! `j` flips its current running state, so mask 0 is "change nothing" and is
//! always tried first.
//!
//! Costs per assignment:
//!
//! | subject        | situation                                          | cost       |
//! |----------------|----------------------------------------------------|------------|
//! | component run  | was stopped, severity `passive`/`present`          | 10         |
//! | component run  | independent, lazy, held running (`stop_eager_running` off) | 10 |
//! | component stop | severity `mandatory`                               | infeasible |
//! | component stop | was running, `stop_eager_running` off              | 10         |
//! | component stop | was running, eager severity                        | 10         |
//! | service        | two running implementations                        | infeasible |
//! | service / edge | no running impl, `mandatory`/`eager_present`       | infeasible |
//! | service / edge | no running impl, `eager_passive`                   | 10         |
//!
//! Everything else costs 0. External services always count as running.

use crate::catalog::{ComponentId, ServiceId};
use crate::error::{Error, Result};
use crate::plan::{ExecutionPlan, PlanSteps};
use crate::severity::Severity;
use crate::snapshot::Snapshot;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Cost of one unwanted transition or unmet preference
pub const PENALTY: u32 = 10;

/// Masks evaluated per parallel work unit
const CHUNK_BITS: u32 = 10;

/// Bounds on the exhaustive search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Refuse to search more than `2^max_free_components` assignments
    pub max_free_components: usize,
    /// Free-component count from which the search is split across threads
    pub parallel_threshold: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_free_components: 20,
            parallel_threshold: 14,
        }
    }
}

/// Compute the cheapest feasible plan for `snapshot`
///
/// Returns `Ok(ExecutionPlan::Impossible)` when no assignment is feasible.
/// The only error is [`Error::SearchTooLarge`].
pub fn solve(
    snapshot: &Snapshot,
    stop_eager_running: bool,
    options: &SolverOptions,
) -> Result<ExecutionPlan> {
    let problem = match Problem::build(snapshot, stop_eager_running) {
        Some(problem) => problem,
        None => {
            log::debug!("Solver: a mandatory service has no remaining implementation");
            return Ok(ExecutionPlan::Impossible);
        }
    };

    let free = problem.free.len();
    let limit = options.max_free_components.min(63);
    if free > limit {
        return Err(Error::SearchTooLarge { free, limit });
    }

    let best = if free >= options.parallel_threshold && free > CHUNK_BITS as usize {
        problem.search_parallel()
    } else {
        problem.search_range(0, 1u64 << free, None)
    };

    let Some((cost, mask)) = best else {
        log::debug!("Solver: all {} assignments infeasible", 1u64 << free);
        return Ok(ExecutionPlan::Impossible);
    };

    log::debug!(
        "Solver: {} components, {} free, {} excluded, best cost {}",
        problem.nodes.len(),
        free,
        problem.excluded.len(),
        cost
    );
    Ok(ExecutionPlan::Ready(problem.plan(mask, cost)))
}

#[derive(Debug, Clone, Copy)]
enum Target {
    /// Index into `Problem::services`
    Service(usize),
    /// Service missing from the catalog; never satisfied
    Missing,
}

#[derive(Debug)]
struct Node<'a> {
    id: &'a ComponentId,
    severity: Severity,
    running: bool,
    service: Option<usize>,
    edges: Vec<(Target, Severity)>,
    /// Independent lazy component kept running only because running
    /// components may not be stopped
    held: bool,
}

#[derive(Debug)]
struct ServiceSlot {
    severity: Severity,
    external: bool,
}

#[derive(Debug)]
struct Problem<'a> {
    nodes: Vec<Node<'a>>,
    services: Vec<ServiceSlot>,
    /// Decisions for locked nodes; free nodes hold their running flag
    base: Vec<bool>,
    /// Node indices enumerated by the search
    free: Vec<usize>,
    excluded: BTreeSet<ComponentId>,
    stop_eager_running: bool,
}

#[derive(Default)]
struct Scratch {
    decisions: Vec<bool>,
    running_impls: Vec<u8>,
}

impl<'a> Problem<'a> {
    /// Partition and lock; `None` if a mandatory service lost every
    /// implementation to exclusion
    fn build(snapshot: &'a Snapshot, stop_eager_running: bool) -> Option<Self> {
        let catalog = snapshot.catalog();

        let mut service_index: BTreeMap<&ServiceId, usize> = BTreeMap::new();
        let mut services = Vec::new();
        for service in catalog.services() {
            service_index.insert(&service.id, services.len());
            services.push(ServiceSlot {
                severity: snapshot.service_severity(&service.id),
                external: service.external,
            });
        }

        let mut nodes = Vec::new();
        let mut independent = Vec::new();
        let mut excluded = BTreeSet::new();
        for component in catalog.components() {
            let severity = snapshot.component_severity(&component.id);
            let service = component
                .implements
                .as_ref()
                .and_then(|s| service_index.get(s).copied());
            let service_excluded = service.is_some_and(|s| services[s].severity.is_excluded());
            if severity.is_excluded() || service_excluded {
                excluded.insert(component.id.clone());
                continue;
            }

            let edges = component
                .dependencies
                .iter()
                .filter_map(|dep| match service_index.get(&dep.service) {
                    Some(&s) if services[s].external => None,
                    Some(&s) => Some((Target::Service(s), dep.level)),
                    None => Some((Target::Missing, dep.level)),
                })
                .collect();

            independent.push(component.is_independent());
            nodes.push(Node {
                id: &component.id,
                severity,
                running: snapshot.is_running(&component.id),
                service,
                edges,
                held: false,
            });
        }

        let mut locked: Vec<Option<bool>> = vec![None; nodes.len()];

        for (i, node) in nodes.iter_mut().enumerate() {
            if node.severity == Severity::Mandatory {
                locked[i] = Some(true);
            } else if independent[i] {
                let eager = node.severity.is_eager();
                node.held = !eager && node.running && !stop_eager_running;
                locked[i] = Some(eager || node.held);
            }
        }

        for (s, slot) in services.iter().enumerate() {
            if slot.external || slot.severity != Severity::Mandatory {
                continue;
            }
            let mut impls = nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.service == Some(s))
                .map(|(i, _)| i);
            match (impls.next(), impls.next()) {
                (None, _) => return None,
                (Some(sole), None) => locked[sole] = Some(true),
                _ => {}
            }
        }

        let base = nodes
            .iter()
            .zip(&locked)
            .map(|(node, lock)| lock.unwrap_or(node.running))
            .collect();
        let free = locked
            .iter()
            .enumerate()
            .filter(|(_, lock)| lock.is_none())
            .map(|(i, _)| i)
            .collect();

        Some(Self {
            nodes,
            services,
            base,
            free,
            excluded,
            stop_eager_running,
        })
    }

    fn scratch(&self) -> Scratch {
        Scratch {
            decisions: self.base.clone(),
            running_impls: vec![0; self.services.len()],
        }
    }

    fn fill(&self, mask: u64, scratch: &mut Scratch) {
        for (bit, &node) in self.free.iter().enumerate() {
            let flip = mask & (1u64 << bit) != 0;
            scratch.decisions[node] = self.nodes[node].running != flip;
        }
    }

    /// Cheapest feasible mask in `start..end`, stopping at the first zero
    ///
    /// `zero_floor` is the lowest mask already known to cost zero; masks
    /// above it cannot win and are skipped.
    fn search_range(
        &self,
        start: u64,
        end: u64,
        zero_floor: Option<&AtomicU64>,
    ) -> Option<(u32, u64)> {
        let mut scratch = self.scratch();
        let mut best: Option<(u32, u64)> = None;
        for mask in start..end {
            if zero_floor.is_some_and(|floor| mask > floor.load(Ordering::Relaxed)) {
                break;
            }
            self.fill(mask, &mut scratch);
            let Some(cost) = self.cost(&mut scratch) else {
                continue;
            };
            if cost == 0 {
                if let Some(floor) = zero_floor {
                    floor.fetch_min(mask, Ordering::Relaxed);
                }
                return Some((0, mask));
            }
            if best.is_none_or(|(lowest, _)| cost < lowest) {
                best = Some((cost, mask));
            }
        }
        best
    }

    /// Same answer as a sequential scan, computed in chunks on the rayon pool
    fn search_parallel(&self) -> Option<(u32, u64)> {
        let free = self.free.len() as u32;
        let chunks = 1u64 << (free - CHUNK_BITS);
        let floor = AtomicU64::new(u64::MAX);
        (0..chunks)
            .into_par_iter()
            .filter_map(|chunk| {
                let start = chunk << CHUNK_BITS;
                if start > floor.load(Ordering::Relaxed) {
                    return None;
                }
                self.search_range(start, start + (1u64 << CHUNK_BITS), Some(&floor))
            })
            .min()
    }

    /// Total cost of `scratch.decisions`, `None` if infeasible
    fn cost(&self, scratch: &mut Scratch) -> Option<u32> {
        let decisions = &scratch.decisions;
        let running_impls = &mut scratch.running_impls;
        running_impls.fill(0);

        for (node, &run) in self.nodes.iter().zip(decisions.iter()) {
            if run && let Some(s) = node.service {
                if running_impls[s] > 0 {
                    return None;
                }
                running_impls[s] = 1;
            }
        }

        let mut total = 0;
        for (node, &run) in self.nodes.iter().zip(decisions.iter()) {
            total += self.component_cost(node, run)?;
        }

        for (slot, &count) in self.services.iter().zip(running_impls.iter()) {
            if !slot.external && count == 0 {
                total += unmet_cost(slot.severity)?;
            }
        }

        for (node, &run) in self.nodes.iter().zip(decisions.iter()) {
            if !run {
                continue;
            }
            for &(target, level) in &node.edges {
                let satisfied = match target {
                    Target::Service(s) => running_impls[s] > 0,
                    Target::Missing => false,
                };
                if !satisfied {
                    total += unmet_cost(level)?;
                }
            }
        }

        Some(total)
    }

    fn component_cost(&self, node: &Node<'_>, run: bool) -> Option<u32> {
        if run {
            if node.held || (!node.running && node.severity.is_lazy()) {
                return Some(PENALTY);
            }
            return Some(0);
        }
        if node.severity == Severity::Mandatory {
            return None;
        }
        if node.running && (!self.stop_eager_running || node.severity.is_eager()) {
            return Some(PENALTY);
        }
        Some(0)
    }

    fn plan(&self, mask: u64, cost: u32) -> PlanSteps {
        let mut scratch = self.scratch();
        self.fill(mask, &mut scratch);

        let mut start = BTreeSet::new();
        let mut stop = BTreeSet::new();
        for (node, &run) in self.nodes.iter().zip(&scratch.decisions) {
            match (node.running, run) {
                (false, true) => {
                    start.insert(node.id.clone());
                }
                (true, false) => {
                    stop.insert(node.id.clone());
                }
                _ => {}
            }
        }
        PlanSteps::new(start, stop, self.excluded.clone(), cost)
    }
}

/// Cost of a service demand (or dependency edge) with nothing running
fn unmet_cost(level: Severity) -> Option<u32> {
    match level {
        Severity::Mandatory | Severity::EagerPresent => None,
        Severity::EagerPassive => Some(PENALTY),
        _ => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Component, Service, Subject};
    use proptest::prelude::*;

    fn ready(plan: ExecutionPlan) -> PlanSteps {
        match plan {
            ExecutionPlan::Ready(steps) => steps,
            ExecutionPlan::Impossible => panic!("expected a feasible plan"),
        }
    }

    fn ids(names: &[&str]) -> BTreeSet<ComponentId> {
        names.iter().map(|n| ComponentId::new(*n)).collect()
    }

    fn run(snapshot: &Snapshot, stop_eager_running: bool) -> ExecutionPlan {
        solve(snapshot, stop_eager_running, &SolverOptions::default()).unwrap()
    }

    #[test]
    fn test_running_implementation_satisfies_mandatory_service() {
        let catalog = Catalog::new()
            .with_service(Service::new("S"))
            .with_component(Component::new("A").implements("S"))
            .with_component(Component::new("B").implements("S"));
        let snapshot = Snapshot::new(catalog)
            .with_service("S", Severity::Mandatory)
            .with_running("A");

        let steps = ready(run(&snapshot, false));
        assert!(steps.is_noop());
        assert!(!steps.start().contains(&ComponentId::new("B")));
        assert_eq!(steps.cost(), 0);
    }

    #[test]
    fn test_independent_eager_component_is_started() {
        let catalog = Catalog::new().with_component(Component::new("C"));
        let snapshot = Snapshot::new(catalog).with_component("C", Severity::EagerPassive);

        let steps = ready(run(&snapshot, false));
        assert_eq!(steps.start(), &ids(&["C"]));
        assert_eq!(steps.cost(), 0);
    }

    #[test]
    fn test_mandatory_edge_to_unimplemented_service_is_impossible() {
        let catalog = Catalog::new()
            .with_service(Service::new("T"))
            .with_component(Component::new("D").depends_on("T", Severity::Mandatory));
        let snapshot = Snapshot::new(catalog).with_component("D", Severity::Mandatory);

        assert!(run(&snapshot, false).is_impossible());
    }

    #[test]
    fn test_passive_running_component_stopped_when_requested() {
        let catalog = Catalog::new().with_component(Component::new("E"));
        let snapshot = Snapshot::new(catalog).with_running("E");

        let steps = ready(run(&snapshot, true));
        assert_eq!(steps.stop(), &ids(&["E"]));
        assert_eq!(steps.cost(), 0);
    }

    #[test]
    fn test_passive_running_component_kept_by_default() {
        let catalog = Catalog::new().with_component(Component::new("E"));
        let snapshot = Snapshot::new(catalog).with_running("E");

        let steps = ready(run(&snapshot, false));
        assert!(steps.stop().is_empty());
        assert!(steps.is_noop());
        assert_eq!(steps.cost(), PENALTY);
    }

    #[test]
    fn test_running_eager_provider_kept_when_stopping_allowed() {
        let catalog = Catalog::new()
            .with_service(Service::new("S"))
            .with_component(Component::new("P").implements("S"));
        let snapshot = Snapshot::new(catalog)
            .with_component("P", Severity::EagerPresent)
            .with_running("P");

        let steps = ready(run(&snapshot, true));
        assert!(steps.is_noop());
        assert_eq!(steps.cost(), 0);
    }

    #[test]
    fn test_stopping_running_eager_provider_is_charged() {
        let catalog = Catalog::new()
            .with_service(Service::new("S"))
            .with_component(Component::new("P").implements("S"))
            .with_component(Component::new("Q").implements("S"));
        let snapshot = Snapshot::new(catalog)
            .with_component("P", Severity::EagerPassive)
            .with_component("Q", Severity::Mandatory)
            .with_running("P");

        let steps = ready(run(&snapshot, true));
        assert_eq!(steps.stop(), &ids(&["P"]));
        assert_eq!(steps.start(), &ids(&["Q"]));
        // Stopping eager P costs 10; Q is mandatory, so starting it is free
        assert_eq!(steps.cost(), PENALTY);
    }

    #[test]
    fn test_excluded_service_excludes_its_implementations() {
        let catalog = Catalog::new()
            .with_service(Service::new("S"))
            .with_component(Component::new("A").implements("S"))
            .with_component(Component::new("B"));
        let snapshot = Snapshot::new(catalog)
            .with_service("S", Severity::Excluded)
            .with_component("B", Severity::Excluded)
            .with_running("A");

        let steps = ready(run(&snapshot, false));
        assert_eq!(steps.exclude(), &ids(&["A", "B"]));
        assert!(steps.stop().is_empty());
        assert!(!steps.runs_after(&"A".into(), true));
    }

    #[test]
    fn test_mandatory_dependency_pulls_in_provider() {
        let catalog = Catalog::new()
            .with_service(Service::new("vcs"))
            .with_component(Component::new("git").implements("vcs"))
            .with_component(Component::new("hg").implements("vcs"))
            .with_component(Component::new("blame").depends_on("vcs", Severity::Mandatory));
        let snapshot = Snapshot::new(catalog).with_component("blame", Severity::Mandatory);

        let steps = ready(run(&snapshot, false));
        assert!(steps.start().contains(&ComponentId::new("blame")));
        // Exactly one provider, enumerated first in id order
        let providers: Vec<_> = steps
            .start()
            .iter()
            .filter(|id| ["git", "hg"].contains(&id.as_str()))
            .collect();
        assert_eq!(providers.len(), 1);
        assert_eq!(steps.cost(), PENALTY);
    }

    #[test]
    fn test_swaps_implementation_when_running_one_is_excluded() {
        let catalog = Catalog::new()
            .with_service(Service::new("S"))
            .with_component(Component::new("A").implements("S"))
            .with_component(Component::new("B").implements("S"));
        let snapshot = Snapshot::new(catalog)
            .with_service("S", Severity::Mandatory)
            .with_component("A", Severity::Excluded)
            .with_running("A");

        let steps = ready(run(&snapshot, false));
        assert_eq!(steps.exclude(), &ids(&["A"]));
        assert_eq!(steps.start(), &ids(&["B"]));
    }

    #[test]
    fn test_two_mandatory_implementations_conflict() {
        let catalog = Catalog::new()
            .with_service(Service::new("S"))
            .with_component(Component::new("A").implements("S"))
            .with_component(Component::new("B").implements("S"));
        let snapshot = Snapshot::new(catalog)
            .with_component("A", Severity::Mandatory)
            .with_component("B", Severity::Mandatory);

        assert!(run(&snapshot, false).is_impossible());
    }

    #[test]
    fn test_mandatory_service_without_implementations_is_impossible() {
        let catalog = Catalog::new().with_service(Service::new("S"));
        let snapshot = Snapshot::new(catalog).with_service("S", Severity::Mandatory);
        assert!(run(&snapshot, false).is_impossible());
    }

    #[test]
    fn test_external_service_always_satisfies_edges() {
        let catalog = Catalog::new()
            .with_service(Service::new("shell").external())
            .with_component(Component::new("term").depends_on("shell", Severity::Mandatory));
        let snapshot = Snapshot::new(catalog).with_component("term", Severity::Mandatory);

        let steps = ready(run(&snapshot, false));
        assert_eq!(steps.start(), &ids(&["term"]));
    }

    #[test]
    fn test_eager_passive_edge_prefers_provider() {
        let catalog = Catalog::new()
            .with_service(Service::new("S"))
            .with_component(Component::new("P").implements("S"))
            .with_component(Component::new("U").depends_on("S", Severity::EagerPassive));
        // Starting P costs 10, leaving the edge unmet costs 10 as well
        let snapshot = Snapshot::new(catalog).with_component("U", Severity::Mandatory);

        let steps = ready(run(&snapshot, false));
        assert_eq!(steps.cost(), PENALTY);
        assert!(steps.start().contains(&ComponentId::new("U")));
    }

    #[test]
    fn test_missing_service_edge_is_unsatisfied() {
        let catalog = Catalog::new()
            .with_component(Component::new("X").depends_on("ghost", Severity::Mandatory));
        let snapshot = Snapshot::new(catalog).with_component("X", Severity::Mandatory);
        assert!(run(&snapshot, false).is_impossible());
    }

    #[test]
    fn test_search_limit() {
        let mut catalog = Catalog::new().with_service(Service::new("S"));
        for i in 0..5 {
            catalog.insert_component(Component::new(format!("c{i}").as_str()).implements("S"));
        }
        let snapshot = Snapshot::new(catalog);
        let options = SolverOptions {
            max_free_components: 4,
            ..SolverOptions::default()
        };
        assert_eq!(
            solve(&snapshot, false, &options),
            Err(Error::SearchTooLarge { free: 5, limit: 4 })
        );
    }

    #[test]
    fn test_parallel_search_matches_sequential() {
        // 11 free components chained through services; the best cost is
        // above zero so the whole space is searched
        let mut catalog = Catalog::new();
        for i in 0..12 {
            let service = format!("s{i}");
            catalog.insert_service(Service::new(service.as_str()));
            let mut component =
                Component::new(format!("c{i}").as_str()).implements(service.as_str());
            if i > 0 {
                let upstream = format!("s{}", i - 1);
                component = component.depends_on(upstream.as_str(), Severity::EagerPassive);
            }
            catalog.insert_component(component);
        }
        let snapshot = Snapshot::new(catalog)
            .with_component("c11", Severity::Mandatory)
            .with_running("c3")
            .with_running("c7");

        let sequential = SolverOptions {
            parallel_threshold: 64,
            ..SolverOptions::default()
        };
        let parallel = SolverOptions {
            parallel_threshold: 11,
            ..SolverOptions::default()
        };
        assert_eq!(
            solve(&snapshot, true, &sequential),
            solve(&snapshot, true, &parallel)
        );
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    #[derive(Debug, Clone)]
    struct Case {
        catalog: Catalog,
        severities: Vec<(Subject, Severity)>,
        running: Vec<ComponentId>,
        stop_eager_running: bool,
    }

    impl Case {
        fn snapshot(&self) -> Snapshot {
            let mut snapshot = Snapshot::new(self.catalog.clone());
            for (subject, severity) in &self.severities {
                snapshot = match subject {
                    Subject::Component(id) => snapshot.with_component(id.clone(), *severity),
                    Subject::Service(id) => snapshot.with_service(id.clone(), *severity),
                };
            }
            for id in &self.running {
                snapshot = snapshot.with_running(id.clone());
            }
            snapshot
        }
    }

    fn severity_strategy() -> impl Strategy<Value = Severity> {
        prop::sample::select(Severity::ALL.to_vec())
    }

    fn case_strategy() -> impl Strategy<Value = Case> {
        let component = (
            prop::option::of(0usize..3),
            prop::collection::vec((0usize..3, severity_strategy()), 0..3),
            severity_strategy(),
            any::<bool>(),
        );
        (
            prop::collection::vec(component, 1..7),
            prop::collection::vec(severity_strategy(), 3),
            any::<bool>(),
        )
            .prop_map(|(components, service_levels, stop_eager_running)| {
                let mut catalog = Catalog::new();
                let mut severities = Vec::new();
                let mut running = Vec::new();
                for (s, level) in service_levels.into_iter().enumerate() {
                    let id = ServiceId::new(format!("s{s}"));
                    catalog.insert_service(Service::new(id.clone()));
                    severities.push((Subject::Service(id), level));
                }
                for (i, (implements, edges, level, is_running)) in
                    components.into_iter().enumerate()
                {
                    let id = ComponentId::new(format!("c{i}"));
                    let mut component = Component::new(id.clone());
                    if let Some(s) = implements {
                        component = component.implements(ServiceId::new(format!("s{s}")));
                    }
                    for (s, edge_level) in edges {
                        component =
                            component.depends_on(ServiceId::new(format!("s{s}")), edge_level);
                    }
                    catalog.insert_component(component);
                    severities.push((Subject::Component(id.clone()), level));
                    if is_running {
                        running.push(id);
                    }
                }
                Case {
                    catalog,
                    severities,
                    running,
                    stop_eager_running,
                }
            })
    }

    fn runs_after(snapshot: &Snapshot, steps: &PlanSteps, id: &ComponentId) -> bool {
        steps.runs_after(id, snapshot.is_running(id))
    }

    proptest! {
        /// Property: no service ends up with two running implementations
        #[test]
        fn plans_respect_service_exclusivity(case in case_strategy()) {
            let snapshot = case.snapshot();
            if let ExecutionPlan::Ready(steps) = run(&snapshot, case.stop_eager_running) {
                for service in snapshot.catalog().services() {
                    let running = snapshot
                        .catalog()
                        .implementations(&service.id)
                        .filter(|c| runs_after(&snapshot, &steps, &c.id))
                        .count();
                    prop_assert!(running <= 1, "service {} has {} running", service.id, running);
                }
            }
        }

        /// Property: every mandatory subject is running after the plan
        #[test]
        fn plans_satisfy_mandatory_subjects(case in case_strategy()) {
            let snapshot = case.snapshot();
            if let ExecutionPlan::Ready(steps) = run(&snapshot, case.stop_eager_running) {
                for component in snapshot.catalog().components() {
                    if snapshot.component_severity(&component.id) == Severity::Mandatory
                        && !steps.exclude().contains(&component.id)
                    {
                        prop_assert!(runs_after(&snapshot, &steps, &component.id));
                    }
                }
                for service in snapshot.catalog().services() {
                    if snapshot.service_severity(&service.id) == Severity::Mandatory {
                        let satisfied = snapshot
                            .catalog()
                            .implementations(&service.id)
                            .any(|c| runs_after(&snapshot, &steps, &c.id));
                        prop_assert!(satisfied, "service {} not running", service.id);
                    }
                }
            }
        }

        /// Property: the plan never costs more than leaving everything alone
        #[test]
        fn plans_are_no_worse_than_doing_nothing(case in case_strategy()) {
            let snapshot = case.snapshot();
            let Some(problem) = Problem::build(&snapshot, case.stop_eager_running) else {
                return Ok(());
            };
            let mut scratch = problem.scratch();
            for (decision, node) in scratch.decisions.iter_mut().zip(&problem.nodes) {
                *decision = node.running;
            }
            let idle = problem.cost(&mut scratch);

            let plan = run(&snapshot, case.stop_eager_running);
            if let Some(idle) = idle {
                let steps = plan.steps();
                prop_assert!(steps.is_some(), "doing nothing is feasible");
                prop_assert!(steps.is_some_and(|s| s.cost() <= idle));
            }
        }
    }
}
