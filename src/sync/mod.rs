//! Synchronization primitives.
//!
//! Thin wrappers over std or parking_lot mutexes.

pub(crate) mod mutex;
