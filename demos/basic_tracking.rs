//! Minimal tracking session.
//!
//! Run with: cargo run --example basic_tracking

use trackalloc::{tracker, TrackScope};

fn main() {
    let scope = TrackScope::new();

    let buffer = tracker::alloc_array(1024);
    assert!(!buffer.is_null());
    unsafe {
        buffer.write_bytes(0, 1024);
        buffer.write(42);
        println!("first byte: {}", buffer.read());
        tracker::release_array_sized(buffer, 1024);
    }

    // Dropping the scope prints the memory report and verifies that
    // every allocation was released.
    drop(scope);
}
