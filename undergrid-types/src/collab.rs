//! Collaborator seams the engine consumes but does not implement.
//!
//! Session/permission UIs and progress displays live outside this workspace;
//! they are passed in explicitly instead of being reached through a global.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Capability required to push drawn changes to the store.
pub const CAP_SAVE_DRAWINGS: &str = "drawing.save";
/// Capability required to wipe every user-drawn row.
pub const CAP_CLEAR_DRAWINGS: &str = "drawing.clear";

/// Answers capability checks for the current session.
pub trait PermissionOracle {
    fn has_capability(&self, capability: &str) -> bool;
}

/// Grants every capability. Used by tools and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionOracle for AllowAll {
    fn has_capability(&self, _capability: &str) -> bool {
        true
    }
}

/// A fixed set of granted capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    granted: HashSet<String>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, capability: impl Into<String>) {
        self.granted.insert(capability.into());
    }

    pub fn revoke(&mut self, capability: &str) {
        self.granted.remove(capability);
    }

    #[must_use]
    pub fn with(mut self, capability: impl Into<String>) -> Self {
        self.grant(capability);
        self
    }
}

impl PermissionOracle for CapabilitySet {
    fn has_capability(&self, capability: &str) -> bool {
        self.granted.contains(capability)
    }
}

/// Receives coarse progress of long-running operations.
///
/// Purely observational: the engine never waits on or branches on a sink.
pub trait ProgressSink {
    fn progress(&mut self, current: usize, total: usize);

    /// Called once when the operation is done with the number of items handled.
    fn finished(&mut self, count: usize) {
        let _ = count;
    }
}

/// Discards every progress event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _current: usize, _total: usize) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, usize),
{
    fn progress(&mut self, current: usize, total: usize) {
        self(current, total);
    }
}

/// Cooperative cancellation for long batch operations.
///
/// Clones share the same flag, so a caller-owned background context can keep
/// one clone and cancel while the engine polls another between items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
