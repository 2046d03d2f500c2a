//! HTTP request parsing.
//!
//! This module turns the bytes of a connection into an [`HttpRequest`],
//! either incrementally through [`RequestParser`] / [`read_request`] or in
//! one shot through [`parse_request`].

mod request;
mod method;
mod reader;
mod error;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use reader::{RequestParser, read_request, DEFAULT_MAX_HEADER_BYTES};
pub use error::Error;

// Re-export the parse_request function
pub use request::parse_request;
