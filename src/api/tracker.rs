//! The interception layer.
//!
//! Every tracked allocation and release funnels through [`allocate`] and
//! [`release`]; the public entry points just fix the allocation kind.
//! With tracking disabled both delegate straight to the raw heap with no
//! bookkeeping.

use std::ptr::NonNull;

use crate::core::deferred;
use crate::core::global;
use crate::core::heap;
use crate::core::ledger;
use crate::core::record::{AllocKind, AllocRecord};
use crate::diagnostics::{self, TA001, TA006, TA201};
use crate::hook;

/// Allocate `user_size` bytes as a single object.
///
/// Returns null if the raw heap is exhausted.
pub fn alloc_single(user_size: usize) -> *mut u8 {
    allocate(user_size, AllocKind::Single)
}

/// Allocate `user_size` bytes as an array.
pub fn alloc_array(user_size: usize) -> *mut u8 {
    allocate(user_size, AllocKind::Array)
}

/// Fallible single-object allocation.
///
/// Returns None on exhaustion instead of null.
pub fn try_alloc_single(user_size: usize) -> Option<NonNull<u8>> {
    NonNull::new(allocate(user_size, AllocKind::Single))
}

/// Fallible array allocation.
pub fn try_alloc_array(user_size: usize) -> Option<NonNull<u8>> {
    NonNull::new(allocate(user_size, AllocKind::Array))
}

/// Release a single-object allocation.
///
/// # Safety
///
/// `user_ptr` must have come from a single-object allocation entry point
/// and must not have been released before.
pub unsafe fn release_single(user_ptr: *mut u8) {
    release(user_ptr, AllocKind::Single, 0);
}

/// Release a single-object allocation, checking the size.
///
/// # Safety
///
/// As [`release_single`]; additionally `user_size` must equal the size
/// requested at allocation time.
pub unsafe fn release_single_sized(user_ptr: *mut u8, user_size: usize) {
    release(user_ptr, AllocKind::Single, user_size);
}

/// Release an array allocation.
///
/// # Safety
///
/// `user_ptr` must have come from an array allocation entry point and
/// must not have been released before.
pub unsafe fn release_array(user_ptr: *mut u8) {
    release(user_ptr, AllocKind::Array, 0);
}

/// Release an array allocation, checking the size.
///
/// # Safety
///
/// As [`release_array`]; additionally `user_size` must equal the size
/// requested at allocation time.
pub unsafe fn release_array_sized(user_ptr: *mut u8, user_size: usize) {
    release(user_ptr, AllocKind::Array, user_size);
}

/// Core allocation path.
pub(crate) fn allocate(user_size: usize, kind: AllocKind) -> *mut u8 {
    if !global::is_tracking_enabled() {
        return heap::raw_alloc(user_size);
    }

    let _internal = hook::internal_section();
    ledger::with_ledger(|ledger| {
        ledger.drain_deferred();

        let total_size = AllocRecord::total_size_for(user_size);
        let base = heap::raw_alloc(total_size);
        if base.is_null() {
            return std::ptr::null_mut();
        }

        // SAFETY: base spans total_size writable bytes.
        let user_ptr = unsafe { AllocRecord::initialize(base, total_size, kind, ledger.id()) };
        // SAFETY: freshly initialized record, not yet linked anywhere.
        unsafe { ledger.insert(AllocRecord::from_user_ptr(user_ptr)) };
        ledger.note_alloc(total_size);

        #[cfg(feature = "debug")]
        crate::debug::trace::record_alloc(base as usize, user_size);

        if global::is_verbose() {
            diagnostics::emit::trace(&format!(
                "allocate size={} kind={:?} base={:p}",
                user_size, kind, base
            ));
        }

        user_ptr
    })
}

/// Core release path.
///
/// A `size_hint` of zero skips the size check. Any invariant violation
/// is fatal; see the TA0xx diagnostics.
///
/// # Safety
///
/// With tracking enabled, `user_ptr` must have been produced by a
/// tracked allocation (the validation that proves it reads memory just
/// before the pointer). With tracking disabled, `user_ptr` must be a raw
/// heap block start.
pub(crate) unsafe fn release(user_ptr: *mut u8, kind: AllocKind, size_hint: usize) {
    if user_ptr.is_null() {
        diagnostics::fatal(&TA001, &format!("kind {:?}", kind));
    }

    if !global::is_tracking_enabled() {
        return heap::raw_free(user_ptr);
    }

    let _internal = hook::internal_section();

    let record = AllocRecord::from_user_ptr(user_ptr);
    (*record).validate(kind, size_hint);
    if !(*record).claim() {
        diagnostics::fatal(&TA006, &format!("pointer {:p}", user_ptr));
    }

    if global::is_verbose() {
        diagnostics::emit::trace(&format!(
            "release size={} kind={:?} base={:p}",
            (*record).user_size(),
            kind,
            (*record).base()
        ));
    }

    let owner = (*record).ledger_id();
    ledger::with_ledger(|ledger| {
        ledger.drain_deferred();

        if owner == ledger.id() {
            // SAFETY: validated, claimed, and linked into this ledger.
            unsafe { ledger.release_record(record) };
        } else {
            // Allocated on another thread: hand the claimed record to
            // its owner, who unlinks, counts, and frees it.
            match deferred::queue_for(owner) {
                Some(queue) => queue.push(record),
                None => diagnostics::fatal(
                    &TA201,
                    &format!("pointer {:p}, ledger {}", user_ptr, owner),
                ),
            }
        }
    });
}
