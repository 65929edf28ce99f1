//! Lifecycle notifications

use crate::error::Result;
use crate::reconciler::ApplyReport;

/// Receiver of orchestrator notifications
///
/// Implement this trait to react to dirtiness changes or finished apply
/// cycles. Callbacks run outside every internal lock.
pub trait LifecycleObserver: Send + Sync {
    /// Called when the orchestrator goes from clean to dirty or back
    fn on_dirty_changed(&self, _dirty: bool) {}

    /// Called after every apply cycle that did work
    fn on_apply_complete(&self, _result: &Result<ApplyReport>) {}
}
