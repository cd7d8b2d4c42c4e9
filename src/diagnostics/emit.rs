//! Diagnostic emission backend.
//!
//! Handles outputting diagnostics to stderr or the log crate, and the
//! fatal path for memory-safety violations.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use super::kind::Diagnostic;
#[cfg(feature = "log")]
use super::kind::DiagnosticKind;

/// Global flag to suppress non-fatal diagnostic output (for testing).
static DIAGNOSTICS_SUPPRESSED: AtomicBool = AtomicBool::new(false);

/// Suppress non-fatal diagnostic output.
pub fn suppress_diagnostics(suppress: bool) {
    DIAGNOSTICS_SUPPRESSED.store(suppress, Ordering::Relaxed);
}

/// Check if diagnostics are suppressed.
pub fn is_suppressed() -> bool {
    DIAGNOSTICS_SUPPRESSED.load(Ordering::Relaxed)
}

/// Emit a non-fatal diagnostic.
///
/// In release builds without the `diagnostics` feature, this is a no-op.
/// In debug builds, this always emits (unless suppressed).
pub fn emit(diag: &Diagnostic) {
    emit_with_context(diag, "");
}

/// Emit a non-fatal diagnostic with additional runtime context.
pub fn emit_with_context(diag: &Diagnostic, context: &str) {
    if is_suppressed() {
        return;
    }

    #[cfg(feature = "log")]
    emit_to_log(diag, context);

    #[cfg(any(debug_assertions, feature = "diagnostics"))]
    emit_to_stderr(diag, context);

    #[cfg(not(any(debug_assertions, feature = "diagnostics")))]
    let _ = (diag, context);
}

/// Report a memory-safety violation and halt.
///
/// Violations indicate a bug in the tracked program; the tracker stops
/// execution at the point of misuse so the surrounding stack trace is
/// useful. Always emits, regardless of suppression, then panics with the
/// diagnostic code in the message.
pub fn fatal(diag: &Diagnostic, context: &str) -> ! {
    #[cfg(feature = "log")]
    emit_to_log(diag, context);

    emit_to_stderr(diag, context);

    if context.is_empty() {
        panic!("[trackalloc][{}] {}", diag.code, diag.message);
    }
    panic!("[trackalloc][{}] {} ({})", diag.code, diag.message, context);
}

/// Internal: emit to stderr.
fn emit_to_stderr(diag: &Diagnostic, context: &str) {
    let mut stderr = std::io::stderr();

    let _ = writeln!(
        stderr,
        "[trackalloc][{}] {}: {}",
        diag.code,
        diag.kind.prefix(),
        diag.message
    );

    if !context.is_empty() {
        let _ = writeln!(stderr, "  context: {}", context);
    }

    if let Some(note) = diag.note {
        let _ = writeln!(stderr, "  note: {}", note);
    }

    if let Some(help) = diag.help {
        let _ = writeln!(stderr, "  help: {}", help);
    }
}

/// Internal: emit through the log crate.
#[cfg(feature = "log")]
fn emit_to_log(diag: &Diagnostic, context: &str) {
    match diag.kind {
        DiagnosticKind::Error => {
            log::error!("[{}] {}", diag.code, diag.message);
        }
        DiagnosticKind::Warning => {
            log::warn!("[{}] {}", diag.code, diag.message);
        }
        DiagnosticKind::Note => {
            log::info!("[{}] {}", diag.code, diag.message);
        }
    }

    if !context.is_empty() {
        log::info!("  context: {}", context);
    }
    if let Some(note) = diag.note {
        log::info!("  note: {}", note);
    }
}

/// Emit a per-operation trace line (verbose sessions only).
pub fn trace(line: &str) {
    if is_suppressed() {
        return;
    }

    #[cfg(feature = "log")]
    log::trace!("{}", line);

    #[cfg(any(debug_assertions, feature = "diagnostics"))]
    {
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "[trackalloc] {}", line);
    }

    #[cfg(not(any(debug_assertions, feature = "diagnostics")))]
    let _ = line;
}

/// Emit the end-of-session summary line.
///
/// This is operator/log output, not machine-parsed; one line per session.
pub fn summary(line: &str) {
    if is_suppressed() {
        return;
    }

    #[cfg(feature = "log")]
    log::info!("{}", line);

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "[trackalloc] {}", line);
}
