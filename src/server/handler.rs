//! Handler contract: what a route calls and what it may return.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::parser::{HttpRequest, Method};
use crate::server::error::Error;
use crate::server::response::{HttpResponse, JSON_CONTENT_TYPE};
use crate::server::status::StatusCode;

/// Type alias for the boxed future a handler returns.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, Error>> + Send>>;

/// Type alias for a type-erased handler.
pub type HandlerFn = Arc<dyn Fn(Params, HttpRequest) -> HandlerFuture + Send + Sync>;

/// Named captures from a matched route pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    /// Get a capture by group name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parse a capture into `T`, or `None` if it is absent or does not parse.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|value| value.parse().ok())
    }

    /// Number of captured groups.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the pattern captured nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<HashMap<String, String>> for Params {
    fn from(map: HashMap<String, String>) -> Self {
        Params(map)
    }
}

/// What a handler produced, before it is turned into a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A complete response, sent as is.
    Response(HttpResponse),
    /// Plain text, sent as `200 OK`.
    Text(String),
    /// A JSON object, sent as `200 OK` with a JSON content type.
    Json(Map<String, Value>),
    /// Anything else. Sent as `500` with this text as the body.
    Other(String),
}

impl Reply {
    /// Wrap a value the dispatcher has no rule for.
    pub fn other(value: impl fmt::Debug) -> Self {
        Reply::Other(format!("{value:?}"))
    }

    /// Serialize `value` and reply with it as JSON if it is an object.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, Error> {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Coerce the reply into the response that goes on the wire.
    pub fn into_response(self) -> HttpResponse {
        match self {
            Reply::Response(response) => response,
            Reply::Text(text) => HttpResponse::text(text),
            Reply::Json(map) => match to_spaced_json(&map) {
                Ok(body) => HttpResponse::new(StatusCode::OK)
                    .with_content_type(JSON_CONTENT_TYPE)
                    .with_body_bytes(body),
                Err(e) => HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR).with_body_string(e.to_string()),
            },
            Reply::Other(text) => HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR).with_body_string(text),
        }
    }
}

impl From<HttpResponse> for Reply {
    fn from(response: HttpResponse) -> Self {
        Reply::Response(response)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<Map<String, Value>> for Reply {
    fn from(map: Map<String, Value>) -> Self {
        Reply::Json(map)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Reply::Json(map),
            Value::String(text) => Reply::Text(text),
            other => Reply::Other(other.to_string()),
        }
    }
}

/// JSON formatting with `", "` between items and `": "` after keys.
///
/// Non-ASCII characters are written as `\uXXXX` escapes.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        let mut units = [0u16; 2];
        for (start, c) in fragment.char_indices() {
            if c.is_ascii() {
                writer.write_all(&fragment.as_bytes()[start..start + 1])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        writer.write_all(b": ")
    }
}

fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(body)
}

/// Represents a route in the HTTP server.
pub struct Route {
    /// The pattern as registered.
    pub pattern: String,
    /// The pattern compiled to match whole paths.
    pub regex: Regex,
    /// The HTTP methods to match.
    pub methods: Vec<Method>,
    /// The handler function.
    pub handler: HandlerFn,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}
