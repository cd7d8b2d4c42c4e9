//! Global shared state: the aggregate counters and the tracking flags.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::stats::{ThreadTotals, TrackStats};
use crate::diagnostics::{self, TA301};
use crate::sync::mutex::Mutex;

/// Process-wide counter aggregate.
///
/// Ledgers fold their totals in here in bulk - at thread teardown and at
/// session end - never on the allocation hot path, so the mutex sees at
/// most a handful of acquisitions per thread lifetime.
pub struct GlobalStats {
    totals: Mutex<TrackStats>,
}

impl GlobalStats {
    const fn new() -> Self {
        Self {
            totals: Mutex::new(TrackStats::new()),
        }
    }

    /// Fold a ledger's counters into the aggregate.
    ///
    /// The four additions are commutative, so merges from different
    /// threads may interleave in any order.
    pub(crate) fn merge(&self, totals: ThreadTotals) {
        let mut global = self.totals.lock();
        global.alloc_count += totals.alloc_count;
        global.release_count += totals.release_count;
        global.allocated_bytes += totals.allocated_bytes;
        global.released_bytes += totals.released_bytes;
    }

    /// Read the current aggregate.
    pub fn snapshot(&self) -> TrackStats {
        *self.totals.lock()
    }

    /// Verify allocation and release totals agree.
    ///
    /// Fatal on mismatch: an imbalance at session end means a leak or an
    /// unmatched release happened somewhere during the session. Performed
    /// under the mutex so a late merge from an exiting thread cannot race
    /// the read.
    pub(crate) fn assert_balanced(&self) {
        let totals = self.totals.lock();
        if !totals.is_balanced() {
            let context = totals.to_string();
            drop(totals);
            diagnostics::fatal(&TA301, &context);
        }
    }
}

static GLOBAL_STATS: GlobalStats = GlobalStats::new();

/// The process-wide aggregate.
pub fn global_stats() -> &'static GlobalStats {
    &GLOBAL_STATS
}

/// Process-wide tracking flag.
///
/// Toggled only through TrackScope; read on every interception-layer
/// call. A single global is the right shape here because the flag must be
/// visible to the `#[global_allocator]` hook regardless of call site.
static TRACKING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Guards against overlapping sessions (nesting is unsupported).
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Per-operation trace output requested by the active session's config.
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Leak reporting at ledger teardown, per the active session's config.
static LEAK_REPORT: AtomicBool = AtomicBool::new(true);

/// Whether allocations are currently being tracked.
pub fn is_tracking_enabled() -> bool {
    TRACKING_ENABLED.load(Ordering::Relaxed)
}

pub(crate) fn set_tracking_enabled(enabled: bool) {
    TRACKING_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Claim the session slot. Returns false if a session is already active.
pub(crate) fn try_begin_session() -> bool {
    !SESSION_ACTIVE.swap(true, Ordering::AcqRel)
}

pub(crate) fn end_session() {
    SESSION_ACTIVE.store(false, Ordering::Release);
}

pub(crate) fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub(crate) fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub(crate) fn leak_report_enabled() -> bool {
    LEAK_REPORT.load(Ordering::Relaxed)
}

pub(crate) fn set_leak_report(enabled: bool) {
    LEAK_REPORT.store(enabled, Ordering::Relaxed);
}
