//! Tracking session scopes.
//!
//! A [`TrackScope`] turns tracking on for its lifetime. Dropping it
//! merges the current thread's ledger into the global aggregate, emits
//! the session summary, and verifies that allocation and release totals
//! balance.

use crate::api::config::TrackConfig;
use crate::core::global;
use crate::core::ledger;
use crate::diagnostics::{self, TA302};
use crate::hook;

/// RAII control object for a tracking session.
///
/// Sessions run one at a time; constructing a second scope while one is
/// active is a fatal diagnostic. Worker threads spawned during a session
/// merge their ledgers when they exit, so join them before the scope
/// ends or their totals (and any pending cross-thread releases) are
/// missing from the balance check.
///
/// # Example
///
/// ```rust,no_run
/// use trackalloc::{tracker, TrackScope};
///
/// let scope = TrackScope::new();
/// let ptr = tracker::alloc_single(64);
/// // ... use the memory ...
/// unsafe { tracker::release_single(ptr) };
/// drop(scope); // merges, reports, asserts balance
/// ```
#[derive(Debug)]
pub struct TrackScope {
    config: TrackConfig,
    enabled: bool,
}

impl TrackScope {
    /// Start a tracking session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TrackConfig::default())
    }

    /// Start a tracking session with an explicit configuration.
    pub fn with_config(config: TrackConfig) -> Self {
        if !global::try_begin_session() {
            diagnostics::fatal(&TA302, "");
        }

        global::set_verbose(config.verbose);
        global::set_leak_report(config.leak_report);
        global::set_tracking_enabled(true);

        Self {
            config,
            enabled: true,
        }
    }

    /// Claim the session slot without enabling tracking.
    ///
    /// Every allocation during such a session passes straight through to
    /// the raw heap; no merge or balance check happens at the end. This
    /// mirrors running a workload with the tracker compiled in but
    /// switched off.
    pub fn disabled() -> Self {
        if !global::try_begin_session() {
            diagnostics::fatal(&TA302, "");
        }

        Self {
            config: TrackConfig::default(),
            enabled: false,
        }
    }

    /// Whether this session actually tracks allocations.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TrackScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TrackScope {
    fn drop(&mut self) {
        if self.enabled {
            let _internal = hook::internal_section();
            let aborted = std::thread::panicking();

            ledger::with_ledger(|ledger| {
                ledger.drain_deferred();
                let totals = ledger.take_totals();
                if !aborted {
                    global::global_stats().merge(totals);
                }
                // A session unwinding from a violation discards its
                // partial totals; they no longer balance by construction.
            });

            // Disable before the balance check so a failed assertion
            // unwinds with tracking already off.
            global::set_tracking_enabled(false);
            global::set_verbose(false);

            if !aborted {
                let snapshot = global::global_stats().snapshot();
                if self.config.emit_summary {
                    diagnostics::emit::summary(&format!("memory report: {}", snapshot));
                }
                global::global_stats().assert_balanced();
            }
        }

        global::end_session();
    }
}
