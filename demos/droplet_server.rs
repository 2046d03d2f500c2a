//! Serves the two classic Droplet routes plus a JSON echo.
//!
//! Run with `RUST_LOG=info cargo run --example droplet_server` and try
//! `curl 'http://127.0.0.1:8080/check/42/'`.

use droplet::{HttpRequest, HttpServer, Method, Params, Reply, Router, ServerConfig, ServerError};
use log::info;
use serde_json::json;

fn describe(request: &HttpRequest) {
    info!("{} {} {}", request.protocol, request.method, request.url);
    info!("query: {:?}", request.query);
    info!("headers: {:?}", request.headers);
    info!("body: {} bytes", request.body.len());
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Initialize the logger
    env_logger::init();

    let mut router = Router::new();

    router.route(r"^/$", |_params, request: HttpRequest| async move {
        describe(&request);
        Ok("Yaay!!\n>( ^ ____ ^ )<")
    })?;

    router.route(r"^/check/(?P<page>\d+)/$", |params: Params, request: HttpRequest| async move {
        describe(&request);
        Ok(format!("Your page: {}", params.get("page").unwrap_or_default()))
    })?;

    router.register(r"^/echo$", &[Method::POST, Method::PUT], |_params, request: HttpRequest| async move {
        describe(&request);
        let body: serde_json::Value = request.json()?;
        Ok::<_, ServerError>(Reply::from(json!({ "method": request.method.to_string(), "received": body })))
    })?;

    let config = ServerConfig {
        server_name: "Droplet".to_string(),
        ..ServerConfig::default()
    };

    HttpServer::new(config, router).start().await
}
