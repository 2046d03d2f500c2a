//! Incremental request reading.
//!
//! [`RequestParser`] is fed bytes as they arrive from the socket and hands
//! out a request only once the request line, the header block and the whole
//! `Content-Length` body have been received. [`read_request`] drives it from
//! any async stream in fixed-size chunks.

use std::collections::HashMap;
use std::mem;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::request::HttpRequest;

/// Default bound on the request line plus header block.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;

#[derive(Debug)]
struct RequestLine {
    method: Method,
    target: String,
    protocol: String,
}

#[derive(Debug)]
enum State {
    RequestLine,
    Headers(RequestLine),
    Body { request_line: RequestLine, length: usize },
    Done,
}

/// Incremental HTTP request parser.
///
/// Bytes are appended with [`feed`](RequestParser::feed); [`parse`](RequestParser::parse)
/// consumes every complete line it can and returns `Ok(None)` until the
/// request is whole. A line is only interpreted once its terminating `\n`
/// has arrived. After an error the parser must not be reused.
#[derive(Debug)]
pub struct RequestParser {
    buffer: Vec<u8>,
    // Start of the unparsed bytes in `buffer`.
    consumed: usize,
    head_bytes: usize,
    max_header_bytes: usize,
    headers: HashMap<String, String>,
    state: State,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    /// Create a parser with the default header size limit.
    pub fn new() -> Self {
        Self::with_max_header_bytes(DEFAULT_MAX_HEADER_BYTES)
    }

    /// Create a parser that rejects header sections longer than `max_header_bytes`.
    pub fn with_max_header_bytes(max_header_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            consumed: 0,
            head_bytes: 0,
            max_header_bytes,
            headers: HashMap::new(),
            state: State::RequestLine,
        }
    }

    /// Append newly received bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Whether the request line and all headers have been parsed.
    pub fn headers_complete(&self) -> bool {
        matches!(self.state, State::Body { .. } | State::Done)
    }

    /// Number of buffered bytes not yet turned into a request.
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.consumed
    }

    /// Try to produce the request from the bytes fed so far.
    ///
    /// # Returns
    ///
    /// `Ok(Some(request))` once the request is complete, `Ok(None)` if more
    /// bytes are needed, or an error if the bytes can not form a request
    pub fn parse(&mut self) -> Result<Option<HttpRequest>, Error> {
        self.parse_head()?;

        match mem::replace(&mut self.state, State::Done) {
            State::Body { request_line, length } if self.buffer.len() >= length => {
                let body = self.buffer[..length].to_vec();
                self.buffer.clear();
                let headers = mem::take(&mut self.headers);
                Ok(Some(HttpRequest::with_body(
                    request_line.method,
                    &request_line.target,
                    request_line.protocol,
                    headers,
                    body,
                )))
            }
            state => {
                self.state = state;
                Ok(None)
            }
        }
    }

    fn parse_head(&mut self) -> Result<(), Error> {
        while matches!(self.state, State::RequestLine | State::Headers(_)) {
            let pending = &self.buffer[self.consumed..];
            let Some(pos) = pending.iter().position(|&b| b == b'\n') else {
                if self.head_bytes + pending.len() > self.max_header_bytes {
                    return Err(Error::HeadersTooLarge(self.max_header_bytes));
                }
                break;
            };

            self.head_bytes += pos + 1;
            if self.head_bytes > self.max_header_bytes {
                return Err(Error::HeadersTooLarge(self.max_header_bytes));
            }

            let line_end = self.consumed + pos;
            let line = &self.buffer[self.consumed..line_end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            self.state = match mem::replace(&mut self.state, State::Done) {
                State::RequestLine => State::Headers(parse_request_line(line)?),
                State::Headers(request_line) if line.is_empty() => State::Body {
                    request_line,
                    length: content_length(&self.headers)?,
                },
                State::Headers(request_line) => {
                    let (name, value) = parse_header_line(line)?;
                    self.headers.insert(name, value);
                    State::Headers(request_line)
                }
                state => state,
            };
            self.consumed = line_end + 1;
        }

        self.buffer.drain(..self.consumed);
        self.consumed = 0;
        Ok(())
    }
}

fn parse_request_line(line: &[u8]) -> Result<RequestLine, Error> {
    let line = std::str::from_utf8(line)
        .map_err(|_| Error::MalformedRequestLine("Invalid UTF-8".to_string()))?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    let [method, target, protocol] = parts[..] else {
        return Err(Error::MalformedRequestLine(line.to_string()));
    };

    Ok(RequestLine {
        method: method.parse()?,
        target: target.to_string(),
        protocol: protocol.to_string(),
    })
}

fn parse_header_line(line: &[u8]) -> Result<(String, String), Error> {
    let line = std::str::from_utf8(line).map_err(|_| Error::InvalidHeaderFormat)?;
    let (name, value) = line.split_once(':').ok_or(Error::InvalidHeaderFormat)?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

// `Content-Length` as spelled wins; otherwise every other spelling must agree.
fn content_length(headers: &HashMap<String, String>) -> Result<usize, Error> {
    let value = match headers.get("Content-Length") {
        Some(value) => Some(value),
        None => {
            let mut values = headers
                .iter()
                .filter(|(name, _)| name.eq_ignore_ascii_case("Content-Length"))
                .map(|(_, value)| value);
            let first = values.next();
            if let Some(other) = values.find(|value| Some(*value) != first) {
                return Err(Error::InvalidContentLength(other.clone()));
            }
            first
        }
    };

    match value {
        None => Ok(0),
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| Error::InvalidContentLength(value.clone())),
    }
}

/// Read exactly one request from `stream`, `chunk_size` bytes at a time.
///
/// A stream that ends before the request is complete yields
/// [`Error::ConnectionClosed`].
pub async fn read_request<S>(stream: &mut S, chunk_size: usize, max_header_bytes: usize) -> Result<HttpRequest, Error>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut parser = RequestParser::with_max_header_bytes(max_header_bytes);
    let mut chunk = vec![0; chunk_size.max(1)];

    loop {
        if let Some(request) = parser.parse()? {
            return Ok(request);
        }

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        parser.feed(&chunk[..n]);
    }
}
