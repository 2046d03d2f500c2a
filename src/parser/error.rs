//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while reading or parsing an HTTP request.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP method in the request is not supported.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request line is malformed (wrong number of fields or not UTF-8).
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// A header line has no `:` separator or is not UTF-8.
    #[error("Invalid header format")]
    InvalidHeaderFormat,

    /// The Content-Length header is not a non-negative integer.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// The header section grew past the configured limit.
    #[error("Header section exceeds {0} bytes")]
    HeadersTooLarge(usize),

    /// A required header is missing from the request.
    #[error("Required header is missing: {0}")]
    MissingHeader(String),

    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,

    /// The input ended before a complete request was seen.
    #[error("Incomplete request")]
    Incomplete,

    /// The peer closed the stream before a complete request arrived.
    #[error("Connection closed before the request was complete")]
    ConnectionClosed,

    /// Reading from the stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing JSON.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error comes from the transport rather than from the bytes received.
    ///
    /// Transport failures end the connection without a response; everything
    /// else is answered with a 4xx status.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::ConnectionClosed | Error::Io(_))
    }
}
