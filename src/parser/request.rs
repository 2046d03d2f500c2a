//! HTTP request representation.

use std::collections::HashMap;
use serde::de::DeserializeOwned;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::reader::RequestParser;

/// Represents a fully received HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, without the query string
    pub url: String,
    /// The protocol token from the request line, e.g. `HTTP/1.1`
    pub protocol: String,
    /// Query parameters parsed from the request target
    pub query: HashMap<String, String>,
    /// The HTTP headers, keyed by the name as sent
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a new HTTP request from a request target.
    ///
    /// The query string, if any, is split off `target` and parsed into
    /// [`HttpRequest::query`]. The body starts out empty.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `target` - The request target, possibly with a query string
    /// * `protocol` - The protocol token
    /// * `headers` - The HTTP headers
    pub fn new(method: Method, target: &str, protocol: impl Into<String>, headers: HashMap<String, String>) -> Self {
        let (url, query) = split_target(target);

        Self {
            method,
            url,
            protocol: protocol.into(),
            query,
            headers,
            body: Vec::new(),
        }
    }

    /// Create a new HTTP request with a body.
    pub fn with_body(
        method: Method,
        target: &str,
        protocol: impl Into<String>,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        let mut request = Self::new(method, target, protocol, headers);
        request.body = body;
        request
    }

    /// Get a header value, ignoring the case of `name`.
    ///
    /// An exact match wins. Otherwise the spelling that sorts first is used.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.get(name).or_else(|| {
            self.headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(name))
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, v)| v)
        })
    }

    /// Check if a header exists, ignoring case.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Parse the request body as JSON.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the request is not declared as
    /// JSON or the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Check if the request has a JSON body.
    pub fn is_json(&self) -> bool {
        self.get_header("Content-Type")
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query.contains_key(name)
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Split a request target into its path and parsed query parameters.
///
/// Pairs without `=` are dropped; a repeated key keeps its last value.
pub(crate) fn split_target(target: &str) -> (String, HashMap<String, String>) {
    let Some((url, query_string)) = target.split_once('?') else {
        return (target.to_string(), HashMap::new());
    };

    let query = query_string
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    (url.to_string(), query)
}

/// Parse a complete HTTP request from a byte slice.
///
/// This is a convenience over [`RequestParser`] for callers that already
/// hold the whole request in memory.
///
/// # Returns
///
/// The parsed HTTP request, [`Error::EmptyRequest`] for empty input, or
/// [`Error::Incomplete`] if the bytes end before the request does
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let mut parser = RequestParser::new();
    parser.feed(input);
    parser.parse()?.ok_or(Error::Incomplete)
}
