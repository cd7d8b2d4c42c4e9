//! Allocation backtrace capture.
//!
//! Keeps a side table from block address to the backtrace captured at
//! allocation time, consumed by the leak report at thread teardown.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::sync::mutex::Mutex;

fn traces() -> &'static Mutex<HashMap<usize, String>> {
    static TRACES: OnceLock<Mutex<HashMap<usize, String>>> = OnceLock::new();
    TRACES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Capture and store the backtrace for a fresh allocation.
pub(crate) fn record_alloc(base: usize, user_size: usize) {
    let backtrace = backtrace::Backtrace::new();
    let trace = format!("  allocated ({} bytes):\n{:?}", user_size, backtrace);
    traces().lock().insert(base, trace);
}

/// Forget the backtrace for a released allocation.
pub(crate) fn record_free(base: usize) {
    traces().lock().remove(&base);
}

/// Remove and return the backtrace for a block, if one was captured.
pub(crate) fn take_trace(base: usize) -> Option<String> {
    traces().lock().remove(&base)
}
