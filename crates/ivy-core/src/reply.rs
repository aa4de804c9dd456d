//! Handler return values.
//!
//! Whatever a handler returns is normalized into a [`Reply`] through
//! [`IntoReply`]. The writer then decides how to put it on the wire.

use std::fmt;

use serde::Serialize;

use crate::error::{IvyError, IvyResult};
use crate::response::ResponseSink;

/// A value that can be rendered as a pretty-printed JSON document.
pub trait StructuredBody: Send {
    /// Serializes the value with four-space indentation.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the value cannot be represented as
    /// JSON.
    fn to_json_pretty(&self) -> Result<String, serde_json::Error>;
}

impl<T: Serialize + Send> StructuredBody for T {
    fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut out = Vec::with_capacity(128);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever writes valid UTF-8.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Callback that takes over the raw response.
pub type RespondFn = Box<dyn FnOnce(&mut dyn ResponseSink) + Send>;

/// The normalized result of a handler.
pub enum Reply {
    /// Nothing to send; the response ends with an empty body.
    Empty,
    /// A plain text body.
    Text(String),
    /// A structured value sent as JSON.
    Json(Box<dyn StructuredBody>),
    /// A callback given the raw response, responsible for ending it.
    Respond(RespondFn),
}

impl Reply {
    /// Builds a text reply.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    /// Builds a JSON reply.
    #[must_use]
    pub fn json<T: Serialize + Send + 'static>(value: T) -> Self {
        Self::Json(Box::new(value))
    }

    /// Builds a reply that writes the response itself.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_core::{Reply, ResponseSink};
    ///
    /// let reply = Reply::respond(|res: &mut dyn ResponseSink| {
    ///     res.set_header("content-type", "text/plain");
    ///     res.end("Hello World".into());
    /// });
    /// assert!(matches!(reply, Reply::Respond(_)));
    /// ```
    #[must_use]
    pub fn respond<F>(f: F) -> Self
    where
        F: FnOnce(&mut dyn ResponseSink) + Send + 'static,
    {
        Self::Respond(Box::new(f))
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(body) => f.debug_tuple("Text").field(body).finish(),
            Self::Json(_) => f.write_str("Json(..)"),
            Self::Respond(_) => f.write_str("Respond(..)"),
        }
    }
}

/// Marks a value to be sent as JSON.
///
/// Strings and numbers are sent as text by default; wrap them in `Json` to
/// force a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

/// Conversion of handler return values into a [`Reply`].
pub trait IntoReply {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns the handler's own error for `Err` results.
    fn into_reply(self) -> IvyResult<Reply>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> IvyResult<Reply> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> IvyResult<Reply> {
        Ok(Reply::Empty)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> IvyResult<Reply> {
        Ok(Reply::Text(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> IvyResult<Reply> {
        Ok(Reply::Text(self.to_string()))
    }
}

macro_rules! text_reply {
    ($($ty:ty),*) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> IvyResult<Reply> {
                    Ok(Reply::Text(self.to_string()))
                }
            }
        )*
    };
}

text_reply!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char);

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> IvyResult<Reply> {
        self.map_or(Ok(Reply::Empty), IntoReply::into_reply)
    }
}

impl<T: Serialize + Send + 'static> IntoReply for Json<T> {
    fn into_reply(self) -> IvyResult<Reply> {
        Ok(Reply::json(self.0))
    }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> IvyResult<Reply> {
        Ok(match self {
            Self::Null => Reply::Empty,
            Self::String(s) => Reply::Text(s),
            Self::Number(n) => Reply::Text(n.to_string()),
            Self::Bool(b) => Reply::Text(b.to_string()),
            value @ (Self::Array(_) | Self::Object(_)) => Reply::json(value),
        })
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<IvyError>,
{
    fn into_reply(self) -> IvyResult<Reply> {
        self.map_err(Into::into)?.into_reply()
    }
}
