//! # trackalloc
//!
//! Thread-smart allocation tracking and memory-safety validation.
//!
//! ## Features
//!
//! - Interception layer with single-object and array entry points
//! - Per-thread ledgers (zero locks on the allocate/release hot path)
//! - Tail-guard overrun detection, kind and size mismatch detection
//! - Double-release detection via a per-record live/freed tag
//! - Cross-thread releases handed to the owning thread's deferred queue
//! - Session scopes that merge per-thread totals and assert balance
//! - Optional `#[global_allocator]` hook for whole-program tracking
//! - Leak reports at thread teardown (with backtraces under `debug`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trackalloc::{tracker, TrackScope};
//!
//! let scope = TrackScope::new();
//!
//! let ptr = tracker::alloc_single(256);
//! // ... use the memory ...
//! unsafe { tracker::release_single_sized(ptr, 256) };
//!
//! drop(scope); // emits the memory report and checks the balance
//! ```
//!
//! With tracking disabled (no active scope, or a [`TrackScope::disabled`]
//! scope) every entry point is a pure pass-through to the system heap.
//!
//! ## Contract
//!
//! Sessions must strictly bracket allocate/release pairs: a tracked
//! pointer released after its session ended takes the pass-through path
//! at the wrong base address. Violations of the tracked invariants
//! (overrun, mismatch, double release) are fatal by design - this is a
//! debugging aid, and stopping at the point of misuse is the point.

pub mod api;
pub mod diagnostics;
pub mod hook;

#[allow(dead_code)]
mod core;
#[allow(dead_code)]
mod sync;
#[allow(dead_code)]
mod util;

#[cfg(feature = "debug")]
#[allow(dead_code)]
mod debug;

// Re-export public API at crate root for convenience
pub use api::config::TrackConfig;
pub use api::scope::TrackScope;
pub use api::stats::TrackStats;
pub use api::tracker;

pub use crate::core::global::is_tracking_enabled;
pub use crate::core::record::{AllocKind, HEADER_SIZE, TAIL_GUARD, TAIL_SIZE};

pub use hook::TrackAlloc;

pub use diagnostics::{suppress_diagnostics, Diagnostic, DiagnosticKind};

/// Snapshot of the process-wide aggregate counters.
pub fn stats() -> TrackStats {
    crate::core::global::global_stats().snapshot()
}
