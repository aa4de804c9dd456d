//! Error reporting seam.
//!
//! Failures turned into `500` responses are also reported here. The default
//! implementation forwards to `tracing`; tests swap in a recorder.

/// Sink for failures the engine recovers from.
pub trait Diagnostics: Send + Sync + 'static {
    /// Reports a failure that produced an error response.
    fn error(&self, message: &str);

    /// Reports a recoverable oddity.
    fn warn(&self, message: &str);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn error(&self, message: &str) {
        tracing::error!(target: "ivy", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "ivy", "{message}");
    }
}
