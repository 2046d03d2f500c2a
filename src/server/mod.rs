//! HTTP server implementation.
//!
//! Routing, handler coercion, response serialization and the connection
//! loop that ties them to the request parser.

mod response;
mod status;
mod config;
mod error;
mod handler;
mod router;
mod http_server;

// Re-export public items
pub use response::{write_response, HttpResponse, DEFAULT_CONTENT_TYPE, JSON_CONTENT_TYPE};
pub use status::{reason_phrase, StatusCode};
pub use config::ServerConfig;
pub use error::Error;
pub use handler::{HandlerFn, HandlerFuture, Params, Reply, Route};
pub use router::Router;
pub use http_server::HttpServer;
