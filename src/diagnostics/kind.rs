//! Diagnostic kinds and core types.
//!
//! Mirrors rustc's diagnostic levels for familiar UX.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A hard error - the tracked program misused memory.
    Error,
    /// A warning - something is probably wrong but execution can continue.
    Warning,
    /// Additional context about another diagnostic.
    Note,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note => "note",
        }
    }
}

/// A diagnostic message with code, message, and optional context.
///
/// Diagnostic codes follow the pattern:
/// - `TA0xx` - Release validation failures
/// - `TA1xx` - Leak reports
/// - `TA2xx` - Threading issues
/// - `TA3xx` - Session lifecycle issues
/// - `TA9xx` - Internal errors
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "TA001").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Add a note to this diagnostic.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (TA0xx - Release validation)
// =============================================================================

/// TA001: Null pointer passed to a release entry point.
pub const TA001: Diagnostic = Diagnostic::error(
    "TA001",
    "null pointer passed to release"
).with_note("the interception layer never hands out null for a successful allocation")
 .with_help("check the allocation result before releasing it");

/// TA002: Stored base address does not match the record's own location.
pub const TA002: Diagnostic = Diagnostic::error(
    "TA002",
    "allocation record base mismatch"
).with_note("the pointer was not produced by a tracked allocation, or its header was overwritten")
 .with_help("release untracked pointers through the allocator that produced them");

/// TA003: Caller-supplied size hint disagrees with the recorded size.
pub const TA003: Diagnostic = Diagnostic::error(
    "TA003",
    "release size does not match the recorded allocation size"
).with_note("a nonzero size hint must equal the size requested at allocation time");

/// TA004: Single/array allocation kind mismatch.
pub const TA004: Diagnostic = Diagnostic::error(
    "TA004",
    "allocation kind mismatch between allocate and release"
).with_help("pair alloc_single with release_single and alloc_array with release_array");

/// TA005: Tail guard overwritten.
pub const TA005: Diagnostic = Diagnostic::error(
    "TA005",
    "memory overrun detected past the end of the allocation"
).with_note("the tail guard value was modified; a write went beyond the requested size");

/// TA006: Block released twice.
pub const TA006: Diagnostic = Diagnostic::error(
    "TA006",
    "double release of the same allocation"
).with_note("the record was already claimed by an earlier release");

// =============================================================================
// Predefined diagnostics (TA1xx - Leaks)
// =============================================================================

/// TA101: Live allocations remained when a thread's ledger was torn down.
pub const TA101: Diagnostic = Diagnostic::warning(
    "TA101",
    "allocations still live at thread exit"
).with_note("every tracked allocation should be released by the thread that made it before it exits")
 .with_help("enable the 'debug' feature to capture allocation backtraces in this report");

// =============================================================================
// Predefined diagnostics (TA2xx - Threading)
// =============================================================================

/// TA201: Release of a block whose owning thread already exited.
pub const TA201: Diagnostic = Diagnostic::error(
    "TA201",
    "release targets a ledger that no longer exists"
).with_note("the thread that allocated this block tore down its ledger before the release arrived")
 .with_help("release memory before the owning thread exits, or keep the owner alive until the release");

// =============================================================================
// Predefined diagnostics (TA3xx - Sessions)
// =============================================================================

/// TA301: Allocation and deallocation totals disagree at session end.
pub const TA301: Diagnostic = Diagnostic::error(
    "TA301",
    "unbalanced session: allocation and release totals disagree"
).with_note("a leak or an unmatched release occurred somewhere during the session")
 .with_help("join worker threads before the session ends so their ledgers merge");

/// TA302: A session was started while another was active.
pub const TA302: Diagnostic = Diagnostic::error(
    "TA302",
    "nested tracking sessions are not supported"
).with_help("end the active TrackScope before starting another");

// =============================================================================
// Predefined diagnostics (TA9xx - Internal)
// =============================================================================

/// TA901: Internal tracker error.
pub const TA901: Diagnostic = Diagnostic::error(
    "TA901",
    "internal tracker error"
).with_note("this indicates a bug in trackalloc")
 .with_help("please report this issue at the trackalloc repository");
