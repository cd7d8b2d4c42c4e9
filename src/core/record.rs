//! Allocation records and release-time validation.
//!
//! Every tracked block is laid out as `[record header | user payload |
//! tail guard]`. The header carries enough information to validate a
//! later release call; the tail guard catches writes past the end of the
//! requested size.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::diagnostics::{self, TA002, TA003, TA004, TA005};
use crate::util::layout::{align_up, RAW_HEAP_ALIGN};

/// Sentinel written directly after the user payload.
pub const TAIL_GUARD: u32 = 0xDEAD_BEEF;

/// Width of the tail guard in bytes.
pub const TAIL_SIZE: usize = std::mem::size_of::<u32>();

/// Bytes between the block start and the user pointer.
///
/// Rounded up so user pointers keep the raw heap's full alignment.
pub const HEADER_SIZE: usize = align_up(std::mem::size_of::<AllocRecord>(), RAW_HEAP_ALIGN);

/// Record state: the block is live.
const STATE_LIVE: u32 = 0xA110_CA7E;
/// Record state: the block was claimed by a release.
const STATE_FREED: u32 = 0xF4EE_D000;

/// Which entry point produced an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AllocKind {
    /// Single-object allocation.
    Single = 1,
    /// Array allocation.
    Array = 2,
}

impl AllocKind {
    fn name(self) -> &'static str {
        match self {
            AllocKind::Single => "single",
            AllocKind::Array => "array",
        }
    }
}

/// Metadata prefixed to every tracked allocation.
///
/// `prev`/`next` are positional links into the owning thread's ledger,
/// never ownership links. All other fields are written once at allocation
/// time; only `state` changes afterwards (live -> freed, exactly once).
#[repr(C)]
pub struct AllocRecord {
    pub(crate) prev: *mut AllocRecord,
    pub(crate) next: *mut AllocRecord,
    base: *mut u8,
    total_size: usize,
    kind: u32,
    state: AtomicU32,
    ledger_id: u64,
}

impl AllocRecord {
    /// Full block size for a user request of `user_size` bytes.
    pub fn total_size_for(user_size: usize) -> usize {
        HEADER_SIZE + user_size + TAIL_SIZE
    }

    /// A ledger anchor node.
    ///
    /// Anchors never represent a live allocation; only their links are
    /// meaningful, and the ledger self-links them on creation.
    pub(crate) fn anchor() -> AllocRecord {
        AllocRecord {
            prev: std::ptr::null_mut(),
            next: std::ptr::null_mut(),
            base: std::ptr::null_mut(),
            total_size: 0,
            kind: 0,
            state: AtomicU32::new(0),
            ledger_id: 0,
        }
    }

    /// Write a fresh record and tail guard into `base`, returning the
    /// user pointer.
    ///
    /// # Safety
    ///
    /// `base` must point to at least `total_size` writable bytes, with
    /// `total_size >= HEADER_SIZE + TAIL_SIZE`.
    pub unsafe fn initialize(
        base: *mut u8,
        total_size: usize,
        kind: AllocKind,
        ledger_id: u64,
    ) -> *mut u8 {
        let record = base as *mut AllocRecord;
        record.write(AllocRecord {
            prev: std::ptr::null_mut(),
            next: std::ptr::null_mut(),
            base,
            total_size,
            kind: kind as u32,
            state: AtomicU32::new(STATE_LIVE),
            ledger_id,
        });

        // The tail lands wherever the user size put it; write unaligned.
        let tail = base.add(total_size - TAIL_SIZE) as *mut u32;
        tail.write_unaligned(TAIL_GUARD);

        base.add(HEADER_SIZE)
    }

    /// Recover the record address from a user pointer.
    ///
    /// # Safety
    ///
    /// `user_ptr` must be non-null. The result is only meaningful for
    /// pointers produced by [`AllocRecord::initialize`]; [`AllocRecord::validate`]
    /// is what decides whether it actually is one.
    pub unsafe fn from_user_ptr(user_ptr: *mut u8) -> *mut AllocRecord {
        user_ptr.sub(HEADER_SIZE) as *mut AllocRecord
    }

    /// Block start as handed out by the raw heap.
    pub fn base(&self) -> *mut u8 {
        self.base
    }

    /// Full block size (header + payload + guard).
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// User-visible size recomputed from the stored total.
    pub fn user_size(&self) -> usize {
        self.total_size - HEADER_SIZE - TAIL_SIZE
    }

    /// Ledger that owns this record.
    pub fn ledger_id(&self) -> u64 {
        self.ledger_id
    }

    /// User payload start.
    pub fn user_ptr(&self) -> *mut u8 {
        // SAFETY: the record sits HEADER_SIZE bytes before its payload.
        unsafe { (self.base as *mut u8).add(HEADER_SIZE) }
    }

    /// Whether the record has not yet been claimed by a release.
    pub fn is_live(&self) -> bool {
        self.state.load(Ordering::Relaxed) == STATE_LIVE
    }

    /// Claim the record for release.
    ///
    /// Returns false if another release already claimed it; the caller
    /// reports that as a double release. The compare-exchange makes a
    /// racing pair of releases lose deterministically instead of both
    /// proceeding to corrupt ledger links.
    pub fn claim(&self) -> bool {
        self.state
            .compare_exchange(STATE_LIVE, STATE_FREED, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Validate a release call against this record.
    ///
    /// Checks run in fixed order: base, size hint, kind, tail guard. Any
    /// failure is a fatal diagnostic; this function only returns for a
    /// valid release. A `size_hint` of zero skips the size check.
    ///
    /// # Safety
    ///
    /// The record pointer behind `self` must be readable for
    /// `HEADER_SIZE` bytes; for a genuine tracked block the stored
    /// `total_size` then makes the tail readable too.
    pub unsafe fn validate(&self, kind: AllocKind, size_hint: usize) {
        let own_base = self as *const AllocRecord as *mut u8;
        if self.base != own_base {
            diagnostics::fatal(
                &TA002,
                &format!("pointer {:p}, stored base {:p}", own_base.add(HEADER_SIZE), self.base),
            );
        }

        if size_hint != 0 && size_hint != self.user_size() {
            diagnostics::fatal(
                &TA003,
                &format!("hint {} bytes, recorded {} bytes", size_hint, self.user_size()),
            );
        }

        if self.kind != kind as u32 {
            let recorded = match self.kind {
                1 => "single",
                2 => "array",
                _ => "corrupt",
            };
            diagnostics::fatal(
                &TA004,
                &format!("allocated as {}, released as {}", recorded, kind.name()),
            );
        }

        let tail = self.base.add(self.total_size - TAIL_SIZE) as *const u32;
        let guard = tail.read_unaligned();
        if guard != TAIL_GUARD {
            diagnostics::fatal(
                &TA005,
                &format!(
                    "guard at {:p} reads {:#010x}, expected {:#010x} ({} byte block)",
                    tail,
                    guard,
                    TAIL_GUARD,
                    self.user_size()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::heap;

    fn make_record(user_size: usize, kind: AllocKind) -> *mut AllocRecord {
        let total = AllocRecord::total_size_for(user_size);
        let base = heap::raw_alloc(total);
        assert!(!base.is_null());
        let user = unsafe { AllocRecord::initialize(base, total, kind, 7) };
        unsafe { AllocRecord::from_user_ptr(user) }
    }

    fn free_record(record: *mut AllocRecord) {
        unsafe { heap::raw_free((*record).base()) };
    }

    #[test]
    fn test_layout_math() {
        assert_eq!(HEADER_SIZE % RAW_HEAP_ALIGN, 0);
        assert!(HEADER_SIZE >= std::mem::size_of::<AllocRecord>());
        assert_eq!(AllocRecord::total_size_for(10), HEADER_SIZE + 10 + TAIL_SIZE);
    }

    #[test]
    fn test_initialize_roundtrip() {
        let record = make_record(24, AllocKind::Array);
        let r = unsafe { &*record };

        assert_eq!(r.user_size(), 24);
        assert_eq!(r.total_size(), AllocRecord::total_size_for(24));
        assert_eq!(r.ledger_id(), 7);
        assert_eq!(r.base(), record as *mut u8);
        assert!(r.is_live());
        assert_eq!(r.user_ptr() as usize - r.base() as usize, HEADER_SIZE);
        assert_eq!(r.user_ptr() as usize % RAW_HEAP_ALIGN, 0);

        unsafe { r.validate(AllocKind::Array, 24) };
        unsafe { r.validate(AllocKind::Array, 0) };

        free_record(record);
    }

    #[test]
    fn test_claim_is_single_shot() {
        let record = make_record(8, AllocKind::Single);
        let r = unsafe { &*record };

        assert!(r.claim());
        assert!(!r.claim());
        assert!(!r.is_live());

        free_record(record);
    }

    #[test]
    #[should_panic(expected = "[trackalloc][TA005]")]
    fn test_validate_detects_tail_overrun() {
        let record = make_record(6, AllocKind::Single);
        let r = unsafe { &*record };

        // Write one guard-width value right past the requested size.
        unsafe {
            let past_end = r.user_ptr().add(6) as *mut u32;
            past_end.write_unaligned(0x1234_5678);
            r.validate(AllocKind::Single, 0);
        }
    }

    #[test]
    #[should_panic(expected = "[trackalloc][TA004]")]
    fn test_validate_detects_kind_mismatch() {
        let record = make_record(8, AllocKind::Array);
        unsafe { (*record).validate(AllocKind::Single, 0) };
    }

    #[test]
    #[should_panic(expected = "[trackalloc][TA003]")]
    fn test_validate_detects_size_mismatch() {
        let record = make_record(8, AllocKind::Single);
        unsafe { (*record).validate(AllocKind::Single, 12) };
    }
}
