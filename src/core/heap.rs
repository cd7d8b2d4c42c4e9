//! Raw system heap backend.
//!
//! The tracker delegates real memory to malloc/free rather than
//! `std::alloc` because release calls carry only an optional size hint;
//! free must work without knowing the block size.

/// Allocate `size` bytes from the system heap.
///
/// Returns null on exhaustion. The block is aligned for any fundamental
/// type (16 bytes on supported targets).
pub fn raw_alloc(size: usize) -> *mut u8 {
    // SAFETY: malloc with any size is sound; a null return is handled by
    // callers.
    unsafe { libc::malloc(size) as *mut u8 }
}

/// Return a block to the system heap.
///
/// # Safety
///
/// `ptr` must be a block start previously returned by [`raw_alloc`] and
/// not yet freed. Null is accepted and ignored, matching free().
pub unsafe fn raw_free(ptr: *mut u8) {
    libc::free(ptr as *mut libc::c_void);
}
