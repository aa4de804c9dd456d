//! Reply serialization.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use ivy_core::{Diagnostics, IvyResult, Reply, ResponseSink};

use crate::dispatcher::panic_message;

/// Body sent when a handler fails or its reply cannot be serialized.
pub const SERVER_ERROR_BODY: &str = "Server error.";

/// Writes dispatch results to the response.
#[derive(Clone)]
pub struct ResponseWriter {
    diagnostics: Arc<dyn Diagnostics>,
}

impl ResponseWriter {
    /// Creates a writer reporting failures to `diagnostics`.
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { diagnostics }
    }

    /// Writes `result`, turning any error into a `500`.
    pub fn write(&self, result: IvyResult<Reply>, response: &mut dyn ResponseSink) {
        match result {
            Ok(reply) => self.write_reply(reply, response),
            Err(err) => {
                self.diagnostics.error(&err.to_string());
                server_error(response);
            }
        }
    }

    /// Writes a successful reply.
    pub fn write_reply(&self, reply: Reply, response: &mut dyn ResponseSink) {
        match reply {
            Reply::Empty => response.end(Bytes::new()),
            Reply::Text(body) => response.end(Bytes::from(body)),
            Reply::Json(value) => match value.to_json_pretty() {
                Ok(body) => {
                    response.set_header("content-type", "application/json");
                    response.end(Bytes::from(body));
                }
                Err(err) => {
                    self.diagnostics
                        .error(&format!("Error while trying to stringify JSON object. {err}"));
                    server_error(response);
                }
            },
            Reply::Respond(respond) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| respond(&mut *response)));
                if let Err(payload) = outcome {
                    self.diagnostics.error(&format!(
                        "Reply callback panicked: {}",
                        panic_message(payload.as_ref())
                    ));
                    server_error(response);
                } else if !response.is_ended() {
                    self.diagnostics
                        .warn("Reply callback did not end the response; ending it empty");
                    response.end(Bytes::new());
                }
            }
        }
    }
}

impl std::fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseWriter").finish_non_exhaustive()
    }
}

fn server_error(response: &mut dyn ResponseSink) {
    if response.is_ended() {
        return;
    }
    response.write_head(StatusCode::INTERNAL_SERVER_ERROR);
    response.end(Bytes::from_static(SERVER_ERROR_BODY.as_bytes()));
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use ivy_core::fixtures::RecordingDiagnostics;
    use ivy_core::{BufferedResponse, IvyError};
    use serde_json::json;

    fn writer() -> (ResponseWriter, Arc<RecordingDiagnostics>) {
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        (ResponseWriter::new(diagnostics.clone()), diagnostics)
    }

    #[test]
    fn test_empty_reply() {
        let (writer, _) = writer();
        let mut res = BufferedResponse::new();
        writer.write(Ok(Reply::Empty), &mut res);

        assert!(res.is_ended());
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.body().is_empty());
    }

    #[test]
    fn test_text_reply() {
        let (writer, _) = writer();
        let mut res = BufferedResponse::new();
        writer.write(Ok(Reply::text("ok")), &mut res);

        assert_eq!(res.body_text(), "ok");
        assert_eq!(res.header("content-type"), None);
    }

    #[test]
    fn test_json_reply_is_pretty() {
        let (writer, _) = writer();
        let mut res = BufferedResponse::new();
        writer.write(Ok(Reply::json(json!({ "id": 1 }))), &mut res);

        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.body_text(), "{\n    \"id\": 1\n}");
    }

    #[test]
    fn test_unserializable_reply() {
        let (writer, diagnostics) = writer();
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], "non-string key");

        let mut res = BufferedResponse::new();
        writer.write(Ok(Reply::json(map)), &mut res);

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body_text(), SERVER_ERROR_BODY);
        assert_eq!(diagnostics.errors().len(), 1);
        assert!(diagnostics.errors()[0]
            .starts_with("Error while trying to stringify JSON object."));
    }

    #[test]
    fn test_handler_error() {
        let (writer, diagnostics) = writer();
        let mut res = BufferedResponse::new();
        writer.write(Err(IvyError::handler("db down")), &mut res);

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body_text(), SERVER_ERROR_BODY);
        assert_eq!(diagnostics.errors(), vec!["Handler error: db down".to_string()]);
    }

    #[test]
    fn test_respond_callback() {
        let (writer, _) = writer();
        let mut res = BufferedResponse::new();
        let reply = Reply::respond(|sink: &mut dyn ResponseSink| {
            sink.set_header("content-type", "text/plain");
            sink.set_header("x-custom", "yes");
            sink.write_head(StatusCode::CREATED);
            sink.end(Bytes::from_static(b"Hello World"));
        });
        writer.write(Ok(reply), &mut res);

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.header("x-custom"), Some("yes"));
        assert_eq!(res.body_text(), "Hello World");
    }

    #[test]
    fn test_respond_callback_left_open() {
        let (writer, diagnostics) = writer();
        let mut res = BufferedResponse::new();
        let reply = Reply::respond(|sink: &mut dyn ResponseSink| {
            sink.set_header("x-partial", "1");
        });
        writer.write(Ok(reply), &mut res);

        assert!(res.is_ended());
        assert_eq!(diagnostics.warnings().len(), 1);
    }

    #[test]
    fn test_respond_callback_panic() {
        let (writer, diagnostics) = writer();
        let mut res = BufferedResponse::new();
        let reply = Reply::respond(|_: &mut dyn ResponseSink| panic!("callback boom"));
        writer.write(Ok(reply), &mut res);

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body_text(), SERVER_ERROR_BODY);
        assert_eq!(
            diagnostics.errors(),
            vec!["Reply callback panicked: callback boom".to_string()]
        );
    }
}
