//! Route registry and request dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use log::{debug, error, warn};
use regex::Regex;
use tokio::task::JoinHandle;

use crate::parser::{HttpRequest, Method};
use crate::server::error::Error;
use crate::server::handler::{HandlerFn, HandlerFuture, Params, Reply, Route};
use crate::server::response::HttpResponse;
use crate::server::status::StatusCode;

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Ordered set of routes.
///
/// Routes are tried in registration order and the first one whose pattern
/// matches the whole request path and whose methods include the request
/// method handles the request. Register more specific patterns first.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for paths matching the regular expression `pattern`.
    ///
    /// The pattern must match the entire path. Named groups such as
    /// `(?P<id>\d+)` are handed to the handler as [`Params`]. An empty
    /// `methods` slice registers the route for `GET`.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateRoute`] if `pattern` is already registered and
    /// [`Error::InvalidPattern`] if it does not compile.
    pub fn register<F, Fut, R>(&mut self, pattern: &str, methods: &[Method], handler: F) -> Result<&mut Self, Error>
    where
        F: Fn(Params, HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        if self.routes.iter().any(|route| route.pattern == pattern) {
            return Err(Error::DuplicateRoute(pattern.to_string()));
        }

        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let methods = if methods.is_empty() {
            vec![Method::GET]
        } else {
            methods.to_vec()
        };

        let handler: HandlerFn = Arc::new(move |params: Params, request: HttpRequest| -> HandlerFuture {
            let reply = handler(params, request);
            Box::pin(async move { reply.await.map(Into::into) })
        });

        self.routes.push(Route {
            pattern: pattern.to_string(),
            regex,
            methods,
            handler,
        });

        Ok(self)
    }

    /// Register a `GET` route.
    pub fn route<F, Fut, R>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, Error>
    where
        F: Fn(Params, HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        self.register(pattern, &[Method::GET], handler)
    }

    /// The registered routes, in matching order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the route for `request` along with its path captures.
    pub fn find(&self, request: &HttpRequest) -> Option<(&Route, Params)> {
        self.routes.iter().find_map(|route| {
            let captures = route.regex.captures(&request.url)?;
            if !route.methods.contains(&request.method) {
                debug!("{} matches {} but not for {}", route.pattern, request.url, request.method);
                return None;
            }

            let params: HashMap<String, String> = route
                .regex
                .capture_names()
                .flatten()
                .filter_map(|name| captures.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
                .collect();

            Some((route, params.into()))
        })
    }

    /// Run the matching handler and turn its result into a response.
    ///
    /// Never fails: unmatched requests get `404 Not Found`, and a handler
    /// that returns an error or panics gets `500 Internal Server Error`.
    pub async fn dispatch(&self, request: HttpRequest) -> HttpResponse {
        let Some((route, params)) = self.find(&request) else {
            debug!("No route for {} {}", request.method, request.url);
            return not_found();
        };

        let handler = route.handler.clone();
        // The handler runs as its own task so a panic is reported as a JoinError.
        let mut task = AbortOnDrop(tokio::spawn(async move { handler(params, request).await }));
        let outcome = (&mut task.0).await;

        match outcome {
            Ok(Ok(Reply::Other(text))) => {
                warn!("Handler for {} returned a value that is not a response: {text}", route.pattern);
                Reply::Other(text).into_response()
            }
            Ok(Ok(reply)) => reply.into_response(),
            Ok(Err(e)) => {
                error!("Handler for {} failed: {e}", route.pattern);
                internal_error()
            }
            Err(e) => {
                error!("Handler for {} panicked: {e}", route.pattern);
                internal_error()
            }
        }
    }
}

fn not_found() -> HttpResponse {
    plain_text(StatusCode::NOT_FOUND, "Not Found")
}

fn internal_error() -> HttpResponse {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Aborts the handler task if the dispatching future is dropped first.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A plain-text response with `status`.
pub(crate) fn plain_text(status: StatusCode, body: impl Into<String>) -> HttpResponse {
    HttpResponse::new(status).with_content_type(PLAIN_TEXT).with_body_string(body)
}
