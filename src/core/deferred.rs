//! Deferred release queue for cross-thread releases.
//!
//! When thread A releases memory that was allocated by thread B, the
//! record is validated and claimed on A, then queued to B's ledger; B
//! unlinks, counts, and frees it on its next tracker call or at thread
//! teardown. Only the owning thread ever touches ledger links.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam_queue::SegQueue;

use crate::core::record::AllocRecord;
use crate::sync::mutex::Mutex;

/// A release that was validated and claimed on a non-owning thread.
struct DeferredRelease {
    record: *mut AllocRecord,
}

// SAFETY: ownership of the claimed record transfers to the owning thread;
// the pushing thread never touches it again.
unsafe impl Send for DeferredRelease {}

/// Lock-free queue of releases waiting for their owning thread.
pub(crate) struct DeferredReleaseQueue {
    queue: SegQueue<DeferredRelease>,
}

impl DeferredReleaseQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: SegQueue::new(),
        }
    }

    /// Queue a claimed record for the owning thread.
    pub(crate) fn push(&self, record: *mut AllocRecord) {
        self.queue.push(DeferredRelease { record });
    }

    /// Take the next pending release, if any.
    pub(crate) fn pop(&self) -> Option<*mut AllocRecord> {
        self.queue.pop().map(|deferred| deferred.record)
    }

    /// Cheap emptiness probe for the hot path.
    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Next ledger id. Zero is reserved so a garbage header never matches.
static NEXT_LEDGER_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_ledger_id() -> u64 {
    NEXT_LEDGER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Process-wide registry: ledger id -> that ledger's deferred queue.
///
/// Touched once per thread lifetime at registration/teardown and on the
/// cross-thread release path; never on same-thread allocate/release.
fn registry() -> &'static Mutex<HashMap<u64, Arc<DeferredReleaseQueue>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, Arc<DeferredReleaseQueue>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

pub(crate) fn register(id: u64, queue: Arc<DeferredReleaseQueue>) {
    registry().lock().insert(id, queue);
}

pub(crate) fn deregister(id: u64) {
    registry().lock().remove(&id);
}

/// Look up the deferred queue for a ledger, if its thread is still alive.
pub(crate) fn queue_for(id: u64) -> Option<Arc<DeferredReleaseQueue>> {
    registry().lock().get(&id).cloned()
}
