//! Requirement aggregation - baseline plus active layers into final severities
//!
//! Every mutation touches only the subjects it affects and moves the dirty
//! counter by the change in each entry's agreement with its last applied
//! severity. The only full rescans are global disable, resolver swap and
//! catalog refresh.

use crate::catalog::{Catalog, ComponentId, Subject};
use crate::layer::RequirementLayer;
use crate::observer::LifecycleObserver;
use crate::plan::PlanSteps;
use crate::resolver::SeverityResolver;
use crate::severity::Severity;
use crate::snapshot::Snapshot;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct Entry {
    baseline: Severity,
    final_severity: Severity,
    /// Severity in force when the last successful plan was applied
    applied: Option<Severity>,
}

impl Entry {
    fn is_dirty(&self) -> bool {
        self.applied != Some(self.final_severity)
    }
}

#[derive(Debug)]
struct LayerSlot {
    layer: RequirementLayer,
    count: usize,
}

/// Final severity bookkeeping for every subject of a catalog
pub struct RequirementAggregator {
    catalog: Arc<Catalog>,
    resolver: Box<dyn SeverityResolver>,
    layers: Vec<LayerSlot>,
    entries: BTreeMap<Subject, Entry>,
    running: BTreeSet<ComponentId>,
    quarantined: BTreeMap<ComponentId, String>,
    disabled: bool,
    dirty_count: usize,
    applying: bool,
    reapply_needed: bool,
}

impl RequirementAggregator {
    /// Track every subject of `catalog`; nothing has been applied yet, so
    /// every entry starts dirty
    pub fn new(catalog: impl Into<Arc<Catalog>>, resolver: Box<dyn SeverityResolver>) -> Self {
        let mut aggregator = Self {
            catalog: catalog.into(),
            resolver,
            layers: Vec::new(),
            entries: BTreeMap::new(),
            running: BTreeSet::new(),
            quarantined: BTreeMap::new(),
            disabled: false,
            dirty_count: 0,
            applying: false,
            reapply_needed: false,
        };
        let subjects: Vec<Subject> = aggregator.catalog.subjects().collect();
        for subject in subjects {
            aggregator.track(subject);
        }
        aggregator
    }

    // ========================================================================
    // Layers
    // ========================================================================

    /// Register a layer
    ///
    /// Returns `false` without effect if an identical layer is already
    /// active and `allow_duplicate` is false.
    pub fn add_layer(&mut self, layer: RequirementLayer, allow_duplicate: bool) -> bool {
        if let Some(slot) = self.layers.iter_mut().find(|s| s.layer == layer) {
            if !allow_duplicate {
                return false;
            }
            // Same content again: final severities cannot change
            slot.count += 1;
            self.touch();
            return true;
        }

        let subjects: Vec<Subject> = layer.subjects().collect();
        log::debug!(
            "Adding requirement layer '{}' ({} subjects)",
            layer.name,
            subjects.len()
        );
        self.layers.push(LayerSlot { layer, count: 1 });
        self.recompute_all_of(&subjects);
        self.touch();
        true
    }

    /// Unregister one occurrence of a layer, or all of them
    ///
    /// Returns `false` if the layer is not active.
    pub fn remove_layer(&mut self, layer: &RequirementLayer, remove_all: bool) -> bool {
        let Some(index) = self.layers.iter().position(|s| &s.layer == layer) else {
            return false;
        };

        if !remove_all && self.layers[index].count > 1 {
            self.layers[index].count -= 1;
            self.touch();
            return true;
        }

        let slot = self.layers.remove(index);
        log::debug!("Removed requirement layer '{}'", slot.layer.name);
        let subjects: Vec<Subject> = slot.layer.subjects().collect();
        self.recompute_all_of(&subjects);
        self.touch();
        true
    }

    /// Swap the content of an active layer, keeping its occurrence count
    ///
    /// Returns `false` if `old` is not active.
    pub fn replace_layer(&mut self, old: &RequirementLayer, new: RequirementLayer) -> bool {
        let Some(index) = self.layers.iter().position(|s| &s.layer == old) else {
            return false;
        };
        if old == &new {
            return true;
        }

        let slot = self.layers.remove(index);
        let subjects: BTreeSet<Subject> = slot.layer.subjects().chain(new.subjects()).collect();

        match self.layers.iter_mut().find(|s| s.layer == new) {
            Some(existing) => existing.count += slot.count,
            None => self.layers.push(LayerSlot {
                layer: new,
                count: slot.count,
            }),
        }

        let subjects: Vec<Subject> = subjects.into_iter().collect();
        self.recompute_all_of(&subjects);
        self.touch();
        true
    }

    /// Active layers with their occurrence counts
    pub fn layers(&self) -> impl Iterator<Item = (&RequirementLayer, usize)> {
        self.layers.iter().map(|s| (&s.layer, s.count))
    }

    // ========================================================================
    // Baseline and catalog
    // ========================================================================

    /// Re-resolve the baseline of the given subjects
    pub fn configuration_changed<'a>(&mut self, subjects: impl IntoIterator<Item = &'a Subject>) {
        let mut changed = false;
        for subject in subjects {
            let baseline = self.resolver.baseline(subject);
            if let Some(entry) = self.entries.get_mut(subject)
                && entry.baseline != baseline
            {
                entry.baseline = baseline;
                self.recompute(subject);
                changed = true;
            }
        }
        if changed {
            self.touch();
        }
    }

    /// Install a new resolver and re-resolve every baseline
    pub fn set_resolver(&mut self, resolver: Box<dyn SeverityResolver>) {
        self.resolver = resolver;
        let subjects: Vec<Subject> = self.entries.keys().cloned().collect();
        for subject in &subjects {
            let baseline = self.resolver.baseline(subject);
            if let Some(entry) = self.entries.get_mut(subject) {
                entry.baseline = baseline;
            }
        }
        self.recompute_all_of(&subjects);
        self.touch();
    }

    /// Replace the catalog after rediscovery
    ///
    /// Subjects that disappeared are dropped along with their running flag
    /// and quarantine; new subjects start dirty.
    pub fn refresh_catalog(&mut self, catalog: impl Into<Arc<Catalog>>) {
        self.catalog = catalog.into();

        let gone: Vec<Subject> = self
            .entries
            .keys()
            .filter(|s| !self.catalog.contains(s))
            .cloned()
            .collect();
        for subject in gone {
            if let Some(entry) = self.entries.remove(&subject)
                && entry.is_dirty()
            {
                self.dec_dirty();
            }
        }

        let catalog = Arc::clone(&self.catalog);
        self.running
            .retain(|id| catalog.component(id).is_some());
        self.quarantined
            .retain(|id, _| catalog.component(id).is_some());

        let subjects: Vec<Subject> = catalog.subjects().collect();
        for subject in &subjects {
            if !self.entries.contains_key(subject) {
                self.track(subject.clone());
            }
        }
        self.recompute_all_of(&subjects);
        self.touch();
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    // ========================================================================
    // Global disable and quarantine
    // ========================================================================

    /// Force every subject to `Excluded` (or lift that)
    pub fn set_globally_disabled(&mut self, disabled: bool) {
        if self.disabled == disabled {
            return;
        }
        self.disabled = disabled;
        let subjects: Vec<Subject> = self.entries.keys().cloned().collect();
        self.recompute_all_of(&subjects);
        self.touch();
    }

    pub fn is_globally_disabled(&self) -> bool {
        self.disabled
    }

    /// Quarantine a component that failed to execute
    ///
    /// The component stays `Excluded` until [`clear_failure`](Self::clear_failure).
    pub fn record_failure(&mut self, id: &ComponentId, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Quarantining component {id}: {message}");
        self.quarantined.insert(id.clone(), message);
        self.recompute(&Subject::Component(id.clone()));
        self.touch();
    }

    /// Lift a quarantine; returns `false` if `id` was not quarantined
    pub fn clear_failure(&mut self, id: &ComponentId) -> bool {
        if self.quarantined.remove(id).is_none() {
            return false;
        }
        log::info!("Cleared quarantine of component {id}");
        self.recompute(&Subject::Component(id.clone()));
        self.touch();
        true
    }

    pub fn is_quarantined(&self, id: &ComponentId) -> bool {
        self.quarantined.contains_key(id)
    }

    /// Quarantined components with the failure that put them there
    pub fn quarantined(&self) -> &BTreeMap<ComponentId, String> {
        &self.quarantined
    }

    // ========================================================================
    // Running flags
    // ========================================================================

    /// Mirror a running-state change observed by the host
    pub fn mark_running(&mut self, id: &ComponentId, running: bool) {
        let changed = if running {
            self.catalog.component(id).is_some() && self.running.insert(id.clone())
        } else {
            self.running.remove(id)
        };
        if changed {
            self.touch();
        }
    }

    pub fn is_running(&self, id: &ComponentId) -> bool {
        self.running.contains(id)
    }

    pub fn running(&self) -> &BTreeSet<ComponentId> {
        &self.running
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn final_severity(&self, subject: &Subject) -> Option<Severity> {
        self.entries.get(subject).map(|e| e.final_severity)
    }

    /// Severity in force at the last successful apply, if any
    pub fn applied_severity(&self, subject: &Subject) -> Option<Severity> {
        self.entries.get(subject).and_then(|e| e.applied)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_count > 0
    }

    /// Copy of all final severities and running flags
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_parts(
            Arc::clone(&self.catalog),
            self.entries
                .iter()
                .map(|(s, e)| (s.clone(), e.final_severity))
                .collect(),
            self.running.clone(),
        )
    }

    // ========================================================================
    // Apply protocol
    // ========================================================================

    /// Start a reconciliation pass: snapshot and watch for mutations
    pub(crate) fn begin_pass(&mut self) -> Snapshot {
        self.applying = true;
        self.reapply_needed = false;
        self.snapshot()
    }

    /// Record a successfully executed plan as the new running baseline
    pub(crate) fn commit(&mut self, snapshot: &Snapshot, steps: &PlanSteps) {
        for id in steps.start() {
            if self.catalog.component(id).is_some() {
                self.running.insert(id.clone());
            }
        }
        for id in steps.stop().iter().chain(steps.exclude()) {
            self.running.remove(id);
        }

        for (subject, severity) in snapshot.severities() {
            if let Some(entry) = self.entries.get_mut(subject) {
                let was_dirty = entry.is_dirty();
                entry.applied = Some(*severity);
                let now_dirty = entry.is_dirty();
                self.adjust_dirty(was_dirty, now_dirty);
            }
        }
    }

    /// End a pass; returns whether anything changed while it ran
    pub(crate) fn end_pass(&mut self) -> bool {
        self.applying = false;
        std::mem::take(&mut self.reapply_needed)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn track(&mut self, subject: Subject) {
        let baseline = self.resolver.baseline(&subject);
        let final_severity = self.compute_final(&subject, baseline);
        self.entries.insert(
            subject,
            Entry {
                baseline,
                final_severity,
                applied: None,
            },
        );
        self.dirty_count += 1;
    }

    fn compute_final(&self, subject: &Subject, baseline: Severity) -> Severity {
        let quarantined = match subject {
            Subject::Component(id) => self.quarantined.contains_key(id),
            Subject::Service(_) => false,
        };
        if self.disabled || quarantined || self.catalog.is_unavailable(subject) {
            return Severity::Excluded;
        }
        self.layers
            .iter()
            .filter_map(|slot| slot.layer.severity_for(subject))
            .fold(baseline, Severity::merge)
    }

    fn recompute(&mut self, subject: &Subject) {
        let Some(entry) = self.entries.get(subject) else {
            return;
        };
        let final_severity = self.compute_final(subject, entry.baseline);
        let Some(entry) = self.entries.get_mut(subject) else {
            return;
        };
        let was_dirty = entry.is_dirty();
        entry.final_severity = final_severity;
        let now_dirty = entry.is_dirty();
        self.adjust_dirty(was_dirty, now_dirty);
    }

    fn recompute_all_of(&mut self, subjects: &[Subject]) {
        for subject in subjects {
            self.recompute(subject);
        }
    }

    fn adjust_dirty(&mut self, was_dirty: bool, now_dirty: bool) {
        match (was_dirty, now_dirty) {
            (false, true) => self.dirty_count += 1,
            (true, false) => self.dec_dirty(),
            _ => {}
        }
    }

    fn dec_dirty(&mut self) {
        debug_assert!(self.dirty_count > 0, "dirty counter underflow");
        self.dirty_count = self.dirty_count.saturating_sub(1);
    }

    fn touch(&mut self) {
        if self.applying {
            self.reapply_needed = true;
        }
    }
}

// ============================================================================
// Shared handle
// ============================================================================

struct Shared {
    state: Mutex<RequirementAggregator>,
    observers: RwLock<Vec<Arc<dyn LifecycleObserver>>>,
}

/// Cloneable, thread-safe handle to a [`RequirementAggregator`]
///
/// All mutations are serialized by one lock. Observers hear about dirty
/// transitions after the lock has been released, so they may call back
/// into the handle.
#[derive(Clone)]
pub struct Requirements {
    shared: Arc<Shared>,
}

impl Requirements {
    pub fn new(aggregator: RequirementAggregator) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(aggregator),
                observers: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn LifecycleObserver>) {
        self.shared.observers.write().push(observer);
    }

    pub(crate) fn observers(&self) -> Vec<Arc<dyn LifecycleObserver>> {
        self.shared.observers.read().clone()
    }

    /// Run `f` under the lock without any notification
    pub fn read<T>(&self, f: impl FnOnce(&RequirementAggregator) -> T) -> T {
        f(&self.shared.state.lock())
    }

    /// Run `f` under the lock, then notify observers if dirtiness flipped
    pub(crate) fn mutate<T>(&self, f: impl FnOnce(&mut RequirementAggregator) -> T) -> T {
        let (result, was_dirty, now_dirty) = {
            let mut state = self.shared.state.lock();
            let was_dirty = state.is_dirty();
            let result = f(&mut state);
            (result, was_dirty, state.is_dirty())
        };
        if was_dirty != now_dirty {
            for observer in self.observers() {
                observer.on_dirty_changed(now_dirty);
            }
        }
        result
    }

    pub fn add_layer(&self, layer: RequirementLayer, allow_duplicate: bool) -> bool {
        self.mutate(|s| s.add_layer(layer, allow_duplicate))
    }

    pub fn remove_layer(&self, layer: &RequirementLayer, remove_all: bool) -> bool {
        self.mutate(|s| s.remove_layer(layer, remove_all))
    }

    pub fn replace_layer(&self, old: &RequirementLayer, new: RequirementLayer) -> bool {
        self.mutate(|s| s.replace_layer(old, new))
    }

    pub fn configuration_changed(&self, subjects: &[Subject]) {
        self.mutate(|s| s.configuration_changed(subjects));
    }

    pub fn set_resolver(&self, resolver: Box<dyn SeverityResolver>) {
        self.mutate(|s| s.set_resolver(resolver));
    }

    pub fn refresh_catalog(&self, catalog: impl Into<Arc<Catalog>>) {
        let catalog = catalog.into();
        self.mutate(|s| s.refresh_catalog(catalog));
    }

    pub fn set_globally_disabled(&self, disabled: bool) {
        self.mutate(|s| s.set_globally_disabled(disabled));
    }

    pub fn record_failure(&self, id: &ComponentId, message: impl Into<String>) {
        let message = message.into();
        self.mutate(|s| s.record_failure(id, message));
    }

    pub fn clear_failure(&self, id: &ComponentId) -> bool {
        self.mutate(|s| s.clear_failure(id))
    }

    pub fn mark_running(&self, id: &ComponentId, running: bool) {
        self.mutate(|s| s.mark_running(id, running));
    }

    pub fn final_severity(&self, subject: &Subject) -> Option<Severity> {
        self.read(|s| s.final_severity(subject))
    }

    pub fn is_dirty(&self) -> bool {
        self.read(RequirementAggregator::is_dirty)
    }

    pub fn is_quarantined(&self, id: &ComponentId) -> bool {
        self.read(|s| s.is_quarantined(id))
    }

    pub fn quarantined(&self) -> BTreeMap<ComponentId, String> {
        self.read(|s| s.quarantined().clone())
    }

    pub fn running(&self) -> BTreeSet<ComponentId> {
        self.read(|s| s.running().clone())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read(RequirementAggregator::snapshot)
    }
}
