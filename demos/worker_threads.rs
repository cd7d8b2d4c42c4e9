//! Tracking across worker threads.
//!
//! Each worker does its bookkeeping in its own ledger; totals fold into
//! the global aggregate when the workers exit. Join every worker before
//! the scope ends, or its numbers are missing from the balance check.
//!
//! Run with: cargo run --example worker_threads

use std::thread;

use trackalloc::{stats, tracker, TrackScope};

fn main() {
    let scope = TrackScope::new();

    let workers: Vec<_> = (0..4)
        .map(|id: usize| {
            thread::spawn(move || {
                for i in 0..50 {
                    let size = 16 + (id * 50 + i) % 240;
                    let ptr = tracker::alloc_single(size);
                    assert!(!ptr.is_null());
                    unsafe {
                        ptr.write(id as u8);
                        tracker::release_single_sized(ptr, size);
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    println!("merged totals so far: {}", stats());
    drop(scope);
}
