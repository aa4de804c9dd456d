//! Test fixtures for Ivy development and testing.
//!
//! Request builders and a [`Diagnostics`] recorder shared by the test suites
//! of the other crates.
//!
//! # Example
//!
//! ```
//! use ivy_core::fixtures;
//! use ivy_core::Diagnostics;
//!
//! let diagnostics = fixtures::RecordingDiagnostics::new();
//! diagnostics.error("boom");
//! assert_eq!(diagnostics.errors(), vec!["boom".to_string()]);
//! ```

use bytes::Bytes;
use http::Method;
use parking_lot::Mutex;

use crate::context::Request;
use crate::diagnostics::Diagnostics;

/// Builds a request with an empty body.
///
/// The method is uppercased. Falls back to `/` if `uri` cannot be parsed.
#[must_use]
pub fn request(method: &str, uri: &str) -> Request {
    request_with_body(method, uri, Bytes::new())
}

/// Builds a request with a body.
#[must_use]
pub fn request_with_body(method: &str, uri: &str, body: impl Into<Bytes>) -> Request {
    let method =
        Method::from_bytes(method.to_ascii_uppercase().as_bytes()).unwrap_or(Method::GET);
    let mut request = http::Request::new(body.into());
    *request.method_mut() = method;
    *request.uri_mut() = uri.parse().unwrap_or_else(|_| http::Uri::from_static("/"));
    request
}

/// Records every diagnostic for later assertions.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded errors.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    /// Returns the recorded warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}
