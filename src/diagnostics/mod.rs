//! Runtime diagnostics.
//!
//! This module provides:
//! - **Diagnostic codes**: Tracker-aware error messages with stable codes
//! - **Emission**: stderr output, optional log-crate routing, test suppression
//! - **Fatal path**: memory-safety violations halt the program at the misuse
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                        |
//! |-------|--------------------------------|
//! | TA0xx | Release validation failures    |
//! | TA1xx | Leak reports                   |
//! | TA2xx | Threading issues               |
//! | TA3xx | Session lifecycle issues       |
//! | TA9xx | Internal errors                |

pub mod emit;
pub mod kind;

pub use emit::{emit, emit_with_context, fatal, is_suppressed, suppress_diagnostics};
pub use kind::{Diagnostic, DiagnosticKind};

pub use kind::{TA001, TA002, TA003, TA004, TA005, TA006, TA101, TA201, TA301, TA302, TA901};
