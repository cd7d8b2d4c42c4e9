//! Session configuration.

/// Configuration for a tracking session.
#[derive(Debug, Clone)]
pub struct TrackConfig {
    /// Emit the one-line memory report when the session ends.
    pub emit_summary: bool,

    /// Warn about still-live allocations when a thread's ledger is torn
    /// down.
    pub leak_report: bool,

    /// Trace every allocate/release call (very noisy).
    pub verbose: bool,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            emit_summary: true,
            leak_report: true,
            verbose: false,
        }
    }
}

impl TrackConfig {
    /// Config that produces no output on the happy path.
    pub fn quiet() -> Self {
        Self {
            emit_summary: false,
            leak_report: false,
            verbose: false,
        }
    }

    /// Builder pattern: toggle the end-of-session summary.
    pub fn with_summary(mut self, emit: bool) -> Self {
        self.emit_summary = emit;
        self
    }

    /// Builder pattern: toggle leak reporting at thread teardown.
    pub fn with_leak_report(mut self, report: bool) -> Self {
        self.leak_report = report;
        self
    }

    /// Builder pattern: toggle per-operation tracing.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
