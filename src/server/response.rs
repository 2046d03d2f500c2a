//! HTTP response types and serialization.

use std::collections::HashMap;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::parser::Method;
use crate::server::error::Error;
use crate::server::status::StatusCode;

/// Content type used when a response does not set its own.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Content type of JSON replies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Represents an HTTP response.
///
/// `headers` only holds what the handler set; the writer adds `Server`,
/// `Allow`, `Content-Length` and `Content-Type` unless they are overridden here.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers overlaying the server defaults
    pub headers: HashMap<String, String>,
    /// The response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response with the given status code and an empty body.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// A `200 OK` response with a text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK).with_body_string(body)
    }

    /// Set the response body with a string.
    pub fn with_body_string(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Set the response body with bytes.
    pub fn with_body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the content type.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Set the response body with a JSON value.
    ///
    /// The body is compact `serde_json` output; use a [`Reply::Json`](crate::server::Reply)
    /// for the spaced form produced by handler coercion.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(value)?;
        Ok(self.with_content_type(JSON_CONTENT_TYPE).with_body_bytes(json))
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The header block that will be written, defaults first.
    ///
    /// Response headers replace defaults with the same name (ignoring case);
    /// the remaining response headers follow in name order.
    pub fn header_lines(&self, server_name: &str) -> Vec<(String, String)> {
        let allow = Method::ALL.map(|m| m.as_str()).join(", ");
        let mut lines = vec![
            ("Server".to_string(), server_name.to_string()),
            ("Allow".to_string(), allow),
            ("Content-Length".to_string(), self.body.len().to_string()),
            ("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string()),
        ];

        let mut extra: Vec<(&String, &String)> = self.headers.iter().collect();
        extra.sort();

        for (name, value) in extra {
            match lines.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
                Some(line) => *line = (name.clone(), value.clone()),
                None => lines.push((name.clone(), value.clone())),
            }
        }

        lines
    }

    /// Convert the response to bytes.
    pub fn to_bytes(&self, server_name: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(256 + self.body.len());

        // Add the status line
        let status_line = format!("HTTP/1.1 {} {}\r\n", self.status, self.status.reason_phrase());
        bytes.extend_from_slice(status_line.as_bytes());

        // Add the headers
        for (name, value) in self.header_lines(server_name) {
            let header_line = format!("{name}: {value}\r\n");
            bytes.extend_from_slice(header_line.as_bytes());
        }

        // Add the empty line that separates headers from body
        bytes.extend_from_slice(b"\r\n");

        // Add the body
        bytes.extend_from_slice(&self.body);

        bytes
    }
}

/// Write `response` to `stream` and close the write side.
pub async fn write_response<W>(stream: &mut W, response: &HttpResponse, server_name: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    stream.write_all(&response.to_bytes(server_name)).await?;
    stream.flush().await?;
    stream.shutdown().await
}
