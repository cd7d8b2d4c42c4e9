//! Per-thread ledgers of live allocations.
//!
//! Each thread owns a circular doubly linked list of its live records
//! plus four running counters, so the allocate/release hot path is pure
//! thread-local mutation with no lock. Counters fold into the global
//! aggregate at thread teardown and at session end.

use std::cell::RefCell;
use std::sync::Arc;

use crate::api::stats::ThreadTotals;
use crate::core::deferred::{self, DeferredReleaseQueue};
use crate::core::global;
use crate::core::heap;
use crate::core::record::AllocRecord;
use crate::diagnostics::{self, TA101};
use crate::hook;

/// Thread-owned bookkeeping for live tracked allocations.
///
/// Only the owning thread touches the list links; cross-thread releases
/// arrive through the deferred queue instead.
pub(crate) struct ThreadLedger {
    id: u64,

    /// Dummy list head. Boxed so its address survives moves of the
    /// ledger itself; never a live record.
    anchor: Box<AllocRecord>,

    /// Linked record count, kept in step with the list.
    len: usize,

    /// Per-thread counters.
    totals: ThreadTotals,

    /// Releases queued to this thread from other threads.
    deferred: Arc<DeferredReleaseQueue>,
}

impl ThreadLedger {
    pub(crate) fn new() -> Self {
        let id = deferred::next_ledger_id();
        let queue = Arc::new(DeferredReleaseQueue::new());
        deferred::register(id, Arc::clone(&queue));

        let mut anchor = Box::new(AllocRecord::anchor());
        let anchor_ptr: *mut AllocRecord = &mut *anchor;
        anchor.prev = anchor_ptr;
        anchor.next = anchor_ptr;

        Self {
            id,
            anchor,
            len: 0,
            totals: ThreadTotals::default(),
            deferred: queue,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Number of records currently linked.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Count records by walking the list from the anchor back to itself.
    pub(crate) fn linked_count(&self) -> usize {
        let anchor: *const AllocRecord = &*self.anchor;
        let mut count = 0;
        // SAFETY: links form a closed cycle through the anchor; every
        // linked record is live and owned by this thread.
        unsafe {
            let mut cursor = (*anchor).next as *const AllocRecord;
            while cursor != anchor {
                count += 1;
                cursor = (*cursor).next;
            }
        }
        count
    }

    /// Link a fresh record at the front of the list.
    ///
    /// # Safety
    ///
    /// `record` must be a valid, unlinked record owned by this ledger.
    pub(crate) unsafe fn insert(&mut self, record: *mut AllocRecord) {
        let anchor: *mut AllocRecord = &mut *self.anchor;
        (*record).next = (*anchor).next;
        (*record).prev = anchor;
        (*(*record).next).prev = record;
        (*anchor).next = record;
        self.len += 1;
    }

    /// Unlink a record using its own links.
    ///
    /// # Safety
    ///
    /// `record` must currently be linked into this ledger.
    pub(crate) unsafe fn remove(&mut self, record: *mut AllocRecord) {
        (*(*record).next).prev = (*record).prev;
        (*(*record).prev).next = (*record).next;
        (*record).next = std::ptr::null_mut();
        (*record).prev = std::ptr::null_mut();
        self.len -= 1;
    }

    /// Count a tracked allocation of `block_size` total bytes.
    pub(crate) fn note_alloc(&mut self, block_size: usize) {
        self.totals.record_alloc(block_size);
    }

    /// Unlink, count, and free a claimed record.
    ///
    /// # Safety
    ///
    /// `record` must be linked into this ledger, already claimed by a
    /// release, and validated.
    pub(crate) unsafe fn release_record(&mut self, record: *mut AllocRecord) {
        let block_size = (*record).total_size();
        let base = (*record).base();
        self.remove(record);
        self.totals.record_release(block_size);

        #[cfg(feature = "debug")]
        {
            crate::debug::trace::record_free(base as usize);
            crate::debug::poison::poison_freed((*record).user_ptr(), (*record).user_size());
        }

        heap::raw_free(base);
    }

    /// Process releases queued by other threads.
    pub(crate) fn drain_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        let queue = Arc::clone(&self.deferred);
        while let Some(record) = queue.pop() {
            // SAFETY: the releasing thread validated and claimed the
            // record before queuing it; it is still linked here.
            unsafe { self.release_record(record) };
        }
    }

    /// Hand off the counters, leaving zeros behind.
    pub(crate) fn take_totals(&mut self) -> ThreadTotals {
        self.totals.take()
    }

    /// Warn about records still linked at teardown.
    fn report_leaks(&self) {
        let leaked = self.linked_count();
        if leaked == 0 || !global::leak_report_enabled() {
            return;
        }

        diagnostics::emit_with_context(
            &TA101,
            &format!("{} allocation(s) never released", leaked),
        );

        #[cfg(feature = "debug")]
        {
            let anchor: *const AllocRecord = &*self.anchor;
            // SAFETY: same cycle walk as linked_count.
            unsafe {
                let mut cursor = (*anchor).next as *const AllocRecord;
                while cursor != anchor {
                    let record = &*cursor;
                    eprintln!(
                        "  leaked: {} bytes at {:p}",
                        record.user_size(),
                        record.user_ptr()
                    );
                    if let Some(trace) = crate::debug::trace::take_trace(record.base() as usize) {
                        eprintln!("{}", trace);
                    }
                    cursor = record.next;
                }
            }
        }
    }
}

impl Drop for ThreadLedger {
    fn drop(&mut self) {
        let _internal = hook::internal_section();

        // Close the registry entry first so late cross-thread releases
        // fail with a diagnostic instead of landing in a dying queue,
        // then reclaim whatever was queued before that point.
        deferred::deregister(self.id);
        self.drain_deferred();

        self.report_leaks();

        if global::is_tracking_enabled() {
            global::global_stats().merge(self.totals.take());
        }
    }
}

thread_local! {
    static LEDGER: RefCell<Option<ThreadLedger>> = const { RefCell::new(None) };
}

/// Execute a closure with access to the calling thread's ledger.
///
/// Creates the ledger lazily on first use.
pub(crate) fn with_ledger<F, R>(f: F) -> R
where
    F: FnOnce(&mut ThreadLedger) -> R,
{
    LEDGER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let ledger = borrow.get_or_insert_with(ThreadLedger::new);
        f(ledger)
    })
}
