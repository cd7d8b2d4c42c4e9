//! Whole-program tracking through the global allocator hook.
//!
//! Every Box, Vec, and String in the program funnels through the
//! tracker while a session is active. The session has to bracket the
//! tracked allocations completely: anything allocated before the scope
//! and freed inside it is reported as a foreign pointer, and anything
//! allocated inside but freed after corrupts the heap. The warmup below
//! triggers the runtime's lazy one-time allocations (stdout buffers and
//! friends) before tracking starts.
//!
//! Run with: cargo run --example global_hook

use trackalloc::{stats, TrackScope};

#[global_allocator]
static ALLOC: trackalloc::TrackAlloc = trackalloc::TrackAlloc;

fn churn() -> usize {
    let numbers: Vec<u64> = (0..1000).collect();
    let strings: Vec<String> = (0..100).map(|i| format!("entry-{i}")).collect();
    numbers.len() + strings.len()
}

fn main() {
    // Warmup: run the workload once untracked so lazy runtime
    // allocations exist before the session starts.
    let warmup = churn();
    println!("warmup touched {} values", warmup);

    {
        let _scope = TrackScope::new();
        let tracked = churn();
        assert_eq!(tracked, warmup);
        println!("tracked so far: {}", stats());
    }
    // Scope end printed the memory report and verified balance.
}
