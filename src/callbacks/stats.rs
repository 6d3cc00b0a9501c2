/*!
 * Dispatch Statistics
 * Relaxed atomic counters with a serializable snapshot
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of table activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub registrations: u64,
    pub removals: u64,
    pub invocations: u64,
    pub skipped: u64,
    pub failures: u64,
    pub passes: u64,
    pub growths: u64,
    pub live: usize,
    pub capacity: usize,
}

/// Atomic dispatch statistics
///
/// # Note
/// Counters are independent; a snapshot taken while another operation is in
/// progress may mix before/after values. This is acceptable for monitoring.
#[derive(Debug, Default)]
pub struct AtomicDispatchStats {
    registrations: AtomicU64,
    removals: AtomicU64,
    invocations: AtomicU64,
    skipped: AtomicU64,
    failures: AtomicU64,
    passes: AtomicU64,
    growths: AtomicU64,
}

impl AtomicDispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_removals(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_growths(&self) {
        self.growths.fetch_add(1, Ordering::Relaxed);
    }

    /// Start a new pass and return its 1-based number
    #[inline]
    pub fn next_pass(&self) -> u64 {
        self.passes.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Snapshot counters, filling in table occupancy
    pub fn snapshot(&self, live: usize, capacity: usize) -> DispatchStats {
        DispatchStats {
            registrations: self.registrations.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            invocations: self.invocations.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            passes: self.passes.load(Ordering::Relaxed),
            growths: self.growths.load(Ordering::Relaxed),
            live,
            capacity,
        }
    }
}
