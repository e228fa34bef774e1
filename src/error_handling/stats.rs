//! Lookup failure statistics tracking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::LookupErrorKind;

/// Thread-safe counters for geolocation lookup failures, by kind.
///
/// All kinds are initialized to zero on creation so increments never have to
/// insert. Shared across lookup tasks via `Arc`.
pub struct LookupStats {
    failures: HashMap<LookupErrorKind, AtomicUsize>,
}

impl LookupStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for kind in LookupErrorKind::iter() {
            failures.insert(kind, AtomicUsize::new(0));
        }
        LookupStats { failures }
    }

    /// Increment the counter for a failure kind.
    pub fn increment(&self, kind: LookupErrorKind) {
        if let Some(counter) = self.failures.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in LookupStats initialization.",
                kind
            );
        }
    }

    /// The count for a failure kind.
    pub fn count(&self, kind: LookupErrorKind) -> usize {
        self.failures
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total failures across all kinds.
    pub fn total(&self) -> usize {
        self.failures
            .values()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    /// Logs a per-kind breakdown of lookup failures, if there were any.
    pub fn log_summary(&self) {
        let total = self.total();
        if total == 0 {
            return;
        }
        log::warn!("{} lookup(s) failed:", total);
        for kind in LookupErrorKind::iter() {
            let count = self.count(kind);
            if count > 0 {
                log::warn!("  {}: {}", kind, count);
            }
        }
    }
}

impl Default for LookupStats {
    fn default() -> Self {
        Self::new()
    }
}
