//! Debug utilities for tracked allocations.
//!
//! Only compiled when the `debug` feature is enabled.

pub(crate) mod poison;
pub(crate) mod trace;
