//! A minimal HTTP/1.1 server with regular-expression routing.
//!
//! Droplet reads one request per connection straight off the socket, hands
//! it to the first route whose pattern matches the path, turns whatever the
//! handler returned into a response and closes the connection.
//!
//! # Features
//!
//! - Incremental request parsing that copes with requests split across reads
//! - `Content-Length` delimited request bodies
//! - Routes matched by regular expression, with named captures passed to handlers
//! - Handlers may return a response, text, or a JSON object
//! - Bounded concurrent connections and graceful shutdown on Ctrl+C
//!
//! # Examples
//!
//! ## Parsing
//!
//! ```
//! use droplet::parse_request;
//!
//! let request_bytes = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
//!
//! let request = parse_request(request_bytes).unwrap();
//! assert_eq!(request.url, "/search");
//! assert_eq!(request.get_query_param("q").unwrap(), "rust");
//! assert_eq!(request.protocol, "HTTP/1.1");
//! ```
//!
//! ## Incremental parsing
//!
//! ```
//! use droplet::RequestParser;
//!
//! let mut parser = RequestParser::new();
//! parser.feed(b"POST /upload HTTP/1.1\r\nContent-Length: 5\r\n\r\nab");
//! assert!(parser.parse().unwrap().is_none());
//!
//! parser.feed(b"cde");
//! let request = parser.parse().unwrap().unwrap();
//! assert_eq!(request.body, b"abcde");
//! ```
//!
//! ## Serving
//!
//! ```no_run
//! use droplet::{HttpServer, Params, Router, ServerConfig, ServerError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let mut router = Router::new();
//!     router.route(r"^/check/(?P<page>\d+)/$", |params: Params, _request| async move {
//!         Ok(format!("Your page: {}", params.get("page").unwrap_or_default()))
//!     })?;
//!
//!     HttpServer::new(ServerConfig::default(), router).start().await
//! }
//! ```
//!
//! See the `demos` directory for a runnable server.

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{parse_request, read_request, Error as ParserError, HttpRequest, Method, RequestParser};
pub use server::{
    Error as ServerError, HttpResponse, HttpServer, Params, Reply, Router, ServerConfig, StatusCode,
};
