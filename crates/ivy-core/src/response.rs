//! The response surface handlers and the writer write to.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Response, StatusCode};

/// Minimal writable response.
///
/// Middleware, `Respond` callbacks and the writer all go through this trait,
/// so the engine can run against a real connection or a buffer alike.
pub trait ResponseSink: Send {
    /// Sets (replaces) a response header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Sets the status code.
    fn write_head(&mut self, status: StatusCode);

    /// Writes the body and finishes the response.
    fn end(&mut self, body: Bytes);

    /// Returns true once [`ResponseSink::end`] was called.
    fn is_ended(&self) -> bool;
}

/// An in-memory response, converted to an [`http::Response`] once ended.
///
/// # Example
///
/// ```
/// use ivy_core::{BufferedResponse, ResponseSink};
///
/// let mut res = BufferedResponse::new();
/// res.set_header("content-type", "text/plain");
/// res.end("Hello World".into());
///
/// assert_eq!(res.status(), http::StatusCode::OK);
/// assert_eq!(res.body_text(), "Hello World");
/// ```
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    ended: bool,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            ended: false,
        }
    }
}

impl BufferedResponse {
    /// Creates an empty `200` response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body decoded as UTF-8, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts into an [`http::Response`].
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for BufferedResponse {
    fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Ignoring invalid response header"),
        }
    }

    fn write_head(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn end(&mut self, body: Bytes) {
        if self.ended {
            tracing::warn!("Response already ended, ignoring body");
            return;
        }
        self.body = body;
        self.ended = true;
    }

    fn is_ended(&self) -> bool {
        self.ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let res = BufferedResponse::new();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.is_ended());
        assert!(res.body().is_empty());
    }

    #[test]
    fn test_second_end_is_ignored() {
        let mut res = BufferedResponse::new();
        res.end(Bytes::from_static(b"first"));
        res.end(Bytes::from_static(b"second"));
        assert_eq!(res.body_text(), "first");
    }

    #[test]
    fn test_set_header_replaces() {
        let mut res = BufferedResponse::new();
        res.set_header("X-Test", "a");
        res.set_header("x-test", "b");
        assert_eq!(res.header("x-test"), Some("b"));
        assert_eq!(res.headers().len(), 1);
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let mut res = BufferedResponse::new();
        res.set_header("bad header", "value");
        assert!(res.headers().is_empty());
    }

    #[test]
    fn test_into_response() {
        let mut res = BufferedResponse::new();
        res.write_head(StatusCode::NOT_FOUND);
        res.set_header("content-type", "text/plain");
        res.end(Bytes::from_static(b"Route not found"));

        let response = res.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(response.body().as_ref(), b"Route not found");
    }
}
