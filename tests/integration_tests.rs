//! Integration tests for trackalloc.
//!
//! Sessions are process-global, so every test that opens one serializes
//! on a shared lock. Violation tests run their session on a dedicated
//! thread: the fatal panic unwinds the scope (which discards the
//! aborted session's totals), so the global aggregate stays balanced
//! for the tests that follow. Tests that *permanently* imbalance the
//! aggregate live in their own files.

use std::any::Any;
use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::thread;

use trackalloc::{stats, tracker, TrackConfig, TrackScope};

fn session_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    match LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        // A violation test panicked while holding the lock; that is expected.
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn panic_message(err: &Box<dyn Any + Send>) -> &str {
    if let Some(message) = err.downcast_ref::<String>() {
        message
    } else if let Some(message) = err.downcast_ref::<&'static str>() {
        message
    } else {
        ""
    }
}

// ============ BALANCE & ROUND-TRIP ============

#[test]
fn test_round_trip_single_and_array() {
    let _guard = session_lock();
    let before = stats();

    {
        // Default config so the summary path runs too.
        let _scope = TrackScope::new();

        let single = tracker::alloc_single(64);
        assert!(!single.is_null());
        let array = tracker::alloc_array(256);
        assert!(!array.is_null());

        unsafe {
            single.write_bytes(0xA5, 64);
            array.write_bytes(0x5A, 256);
            assert_eq!(single.read(), 0xA5);
            assert_eq!(array.add(255).read(), 0x5A);

            tracker::release_array_sized(array, 256);
            tracker::release_single_sized(single, 64);
        }
    }

    let after = stats();
    assert_eq!(after.alloc_count - before.alloc_count, 2);
    assert_eq!(after.release_count - before.release_count, 2);
    assert_eq!(
        after.allocated_bytes - before.allocated_bytes,
        after.released_bytes - before.released_bytes
    );
}

#[test]
fn test_round_trip_many_sizes() {
    let _guard = session_lock();
    let before = stats();

    {
        let _scope = TrackScope::with_config(TrackConfig::quiet());

        for size in (1..=64).chain([128, 1024, 4096]) {
            let ptr = tracker::alloc_single(size);
            assert!(!ptr.is_null(), "allocation of {} bytes failed", size);
            unsafe {
                // Touch first and last byte of the usable region.
                ptr.write(1);
                ptr.add(size - 1).write(2);
                tracker::release_single_sized(ptr, size);
            }
        }
    }

    let after = stats();
    assert_eq!(after.alloc_count - before.alloc_count, 67);
    assert_eq!(after.release_count - before.release_count, 67);
    assert_eq!(
        after.allocated_bytes - before.allocated_bytes,
        after.released_bytes - before.released_bytes
    );
}

#[test]
fn test_try_alloc_variants() {
    let _guard = session_lock();

    {
        let _scope = TrackScope::with_config(TrackConfig::quiet());

        let single = tracker::try_alloc_single(32).expect("allocation failed");
        let array = tracker::try_alloc_array(48).expect("allocation failed");

        unsafe {
            tracker::release_single(single.as_ptr());
            tracker::release_array(array.as_ptr());
        }
    }
}

// ============ PASS-THROUGH & TRANSPARENCY ============

#[test]
fn test_disabled_session_leaves_aggregate_untouched() {
    let _guard = session_lock();
    let before = stats();

    {
        let scope = TrackScope::disabled();
        assert!(!scope.is_enabled());
        assert!(!trackalloc::is_tracking_enabled());

        for _ in 0..1000 {
            let ptr = tracker::alloc_single(32);
            assert!(!ptr.is_null());
            unsafe {
                ptr.write_bytes(0x77, 32);
                assert_eq!(ptr.add(31).read(), 0x77);
                tracker::release_single(ptr);
            }
        }
    }

    assert_eq!(stats(), before);
}

#[test]
fn test_no_session_is_pure_passthrough() {
    let _guard = session_lock();
    let before = stats();

    let ptr = tracker::alloc_array(512);
    assert!(!ptr.is_null());
    unsafe {
        ptr.write_bytes(0x11, 512);
        assert_eq!(ptr.add(511).read(), 0x11);
        tracker::release_array(ptr);
    }

    assert_eq!(stats(), before);
}

// ============ MULTI-THREADED ============

#[test]
fn test_cross_thread_isolation_counts() {
    let _guard = session_lock();
    let before = stats();

    {
        let _scope = TrackScope::with_config(TrackConfig::quiet());

        let a = thread::spawn(|| {
            for size in [16usize, 32, 48, 64, 80] {
                let ptr = tracker::alloc_single(size);
                assert!(!ptr.is_null());
                unsafe { tracker::release_single_sized(ptr, size) };
            }
        });
        let b = thread::spawn(|| {
            for _ in 0..3 {
                let ptr = tracker::alloc_array(128);
                assert!(!ptr.is_null());
                unsafe { tracker::release_array_sized(ptr, 128) };
            }
        });

        a.join().expect("thread A panicked");
        b.join().expect("thread B panicked");

        // Both ledgers merged at thread exit.
        let mid = stats();
        assert_eq!(mid.alloc_count - before.alloc_count, 8);
        assert_eq!(mid.release_count - before.release_count, 8);
        assert_eq!(
            mid.allocated_bytes - before.allocated_bytes,
            mid.released_bytes - before.released_bytes
        );
    }
}

#[test]
fn test_multithread_stress_balances() {
    let _guard = session_lock();
    let before = stats();

    {
        let _scope = TrackScope::with_config(TrackConfig::quiet());

        let handles: Vec<_> = (0..4)
            .map(|thread_id: usize| {
                thread::spawn(move || {
                    let mut ptrs = Vec::new();
                    for i in 0..100 {
                        let size = 1 + (thread_id * 100 + i) % 256;
                        let ptr = tracker::alloc_single(size);
                        assert!(!ptr.is_null());
                        unsafe { ptr.write(thread_id as u8) };
                        ptrs.push((ptr, size));
                    }
                    for (ptr, size) in ptrs {
                        unsafe {
                            assert_eq!(ptr.read(), thread_id as u8);
                            tracker::release_single_sized(ptr, size);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker panicked");
        }
    }

    let after = stats();
    assert_eq!(after.alloc_count - before.alloc_count, 400);
    assert_eq!(after.release_count - before.release_count, 400);
    assert_eq!(
        after.allocated_bytes - before.allocated_bytes,
        after.released_bytes - before.released_bytes
    );
}

#[test]
fn test_cross_thread_release_is_deferred_to_owner() {
    let _guard = session_lock();
    let before = stats();

    {
        let _scope = TrackScope::with_config(TrackConfig::quiet());

        let (ptr_tx, ptr_rx) = mpsc::channel::<usize>();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let owner = thread::spawn(move || {
            let ptr = tracker::alloc_single(96);
            assert!(!ptr.is_null());
            ptr_tx.send(ptr as usize).unwrap();
            // Stay alive until the release has been queued; teardown
            // drains it and counts the release on this ledger.
            done_rx.recv().unwrap();
        });

        let ptr = ptr_rx.recv().unwrap() as *mut u8;
        unsafe { tracker::release_single(ptr) };
        done_tx.send(()).unwrap();
        owner.join().expect("owner panicked");
    }

    let after = stats();
    assert_eq!(after.alloc_count - before.alloc_count, 1);
    assert_eq!(after.release_count - before.release_count, 1);
    assert_eq!(
        after.allocated_bytes - before.allocated_bytes,
        after.released_bytes - before.released_bytes
    );
}

// ============ VIOLATION DETECTION ============
//
// Each violation runs in its own thread holding its own scope: the
// fatal diagnostic unwinds the scope, the aborted session's totals are
// discarded, and the global aggregate stays balanced.

#[test]
fn test_overrun_detection() {
    let _guard = session_lock();

    let handle = thread::spawn(|| {
        let _scope = TrackScope::with_config(TrackConfig::quiet());
        let ptr = tracker::alloc_single(8);
        assert!(!ptr.is_null());
        unsafe {
            // One guard-width write directly past the requested size.
            (ptr.add(8) as *mut u32).write_unaligned(0x4141_4141);
            tracker::release_single(ptr);
        }
    });

    let err = handle.join().expect_err("overrun must be fatal");
    assert!(panic_message(&err).contains("TA005"));
}

#[test]
fn test_kind_mismatch_detection() {
    let _guard = session_lock();

    let handle = thread::spawn(|| {
        let _scope = TrackScope::with_config(TrackConfig::quiet());
        let ptr = tracker::alloc_array(24);
        assert!(!ptr.is_null());
        unsafe { tracker::release_single(ptr) };
    });

    let err = handle.join().expect_err("kind mismatch must be fatal");
    assert!(panic_message(&err).contains("TA004"));
}

#[test]
fn test_size_mismatch_detection() {
    let _guard = session_lock();

    let handle = thread::spawn(|| {
        let _scope = TrackScope::with_config(TrackConfig::quiet());
        let ptr = tracker::alloc_single(10);
        assert!(!ptr.is_null());
        unsafe { tracker::release_single_sized(ptr, 12) };
    });

    let err = handle.join().expect_err("size mismatch must be fatal");
    assert!(panic_message(&err).contains("TA003"));
}

#[test]
fn test_double_release_detection() {
    let _guard = session_lock();

    let (start_tx, start_rx) = mpsc::channel::<()>();
    let (ptr_tx, ptr_rx) = mpsc::channel::<usize>();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    // The owner keeps the block's memory alive (queued, not yet freed)
    // so the second release deterministically hits the freed tag.
    let owner = thread::spawn(move || {
        start_rx.recv().unwrap();
        let ptr = tracker::alloc_single(40);
        assert!(!ptr.is_null());
        ptr_tx.send(ptr as usize).unwrap();
        let _ = done_rx.recv();
    });

    let violator = thread::spawn(move || {
        let _scope = TrackScope::with_config(TrackConfig::quiet());
        start_tx.send(()).unwrap();
        let ptr = ptr_rx.recv().unwrap() as *mut u8;
        unsafe {
            tracker::release_single(ptr);
            tracker::release_single(ptr);
        }
        done_tx.send(()).unwrap();
    });

    let err = violator.join().expect_err("double release must be fatal");
    assert!(panic_message(&err).contains("TA006"));
    owner.join().expect("owner panicked");
}

#[test]
fn test_nested_session_rejected() {
    let _guard = session_lock();

    {
        let _outer = TrackScope::with_config(TrackConfig::quiet());

        let inner = thread::spawn(TrackScope::new);
        let err = inner.join().expect_err("nested session must be fatal");
        assert!(panic_message(&err).contains("TA302"));
    }

    // The outer session slot is released; a fresh one works.
    let _again = TrackScope::disabled();
}
