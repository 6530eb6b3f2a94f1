use crate::error::DispatchFailure;
use std::io::{self, Write};

/// Banner written in front of every shipping failure on stderr.
pub const ERROR_BANNER: &str = "--- Logging error ---";

/// Side channel for shipping failures.
///
/// Failures are never routed back through the logging pipeline, otherwise a
/// dead destination would feed the handler its own error records.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, failure: &DispatchFailure);
}

/// Writes failures to the process stderr, prefixed by [`ERROR_BANNER`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrDiagnostics;

impl DiagnosticSink for StderrDiagnostics {
    fn report(&self, failure: &DispatchFailure) {
        // Nothing sensible is left to do if stderr itself is gone.
        let _ = write_report(&mut io::stderr().lock(), failure);
    }
}

/// Write one failure report: the banner line, then the failure.
pub fn write_report(out: &mut impl Write, failure: &DispatchFailure) -> io::Result<()> {
    writeln!(out, "{}", ERROR_BANNER)?;
    writeln!(out, "{}", failure)?;
    out.flush()
}
