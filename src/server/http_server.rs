//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::signal;
use log::{debug, error, info, warn};

use crate::parser::{read_request, Error as ParserError};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::write_response;
use crate::server::router::{plain_text, Router};
use crate::server::status::StatusCode;

/// An HTTP server.
///
/// Routes are fixed when the server is created; the router is shared
/// read-only between connections.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    router: Arc<Router>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and routes.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// The routes this server dispatches to.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Log the registered endpoints.
    fn display_server_info(&self) {
        info!("{name} starting", name = self.config.server_name);
        info!("Registered endpoints:");
        for route in self.router.routes() {
            let methods = route.methods.iter()
                .map(|m| m.to_string())
                .collect::<Vec<String>>()
                .join(", ");
            info!("  {methods} {}", route.pattern);
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Resolves on Ctrl+C. Never resolves if the handler can not be installed.
    async fn ctrl_c() {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
            Err(e) => {
                error!("Error setting up Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    }

    /// Handle a new connection.
    async fn handle_new_connection(
        mut socket: TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        router: Arc<Router>,
        config: Arc<ServerConfig>,
        tasks: &mut JoinSet<()>,
    ) {
        // Try to acquire a permit from the semaphore
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let response = plain_text(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Server is at capacity, please try again later",
                );
                let _ = write_response(&mut socket, &response, &config.server_name).await;
                return;
            }
        };

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            match Self::handle_connection(&mut socket, &router, &config).await {
                Ok(()) => {}
                Err(e @ (Error::Timeout | Error::ParseError(_))) => warn!("Request from {addr} dropped: {e}"),
                Err(e) => error!("Error handling connection from {addr}: {e}"),
            }
        });
    }

    /// Handle connection errors.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        // If there's a critical error, signal to break the loop
        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // For other errors, wait a bit before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        false
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        // Wait for all tasks to complete (with timeout)
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = tokio::time::Duration::from_secs(30);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        }).await;

        info!("Server shutdown complete");
    }

    /// Bind the configured address and serve until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        self.config.validate()?;
        self.display_server_info();

        let listener = self.setup_listener().await?;
        self.serve_with_shutdown(listener, Self::ctrl_c()).await
    }

    /// Serve connections from `listener` until `shutdown` resolves.
    ///
    /// In-flight connections are given up to 30 seconds to finish.
    pub async fn serve_with_shutdown<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        self.config.validate()?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let config = Arc::new(self.config.clone());

        // Use JoinSet to keep track of all spawned tasks
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check for shutdown signal
                _ = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }

                // Reap finished connections
                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = res {
                        error!("Connection task failed: {e}");
                    }
                }

                // Accept new connections
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            debug!("Accepted connection from {addr}");
                            Self::handle_new_connection(
                                socket,
                                addr,
                                semaphore.clone(),
                                self.router.clone(),
                                config.clone(),
                                &mut tasks
                            ).await;
                        },
                        Err(e) => {
                            if Self::handle_connection_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        // Perform graceful shutdown
        Self::perform_shutdown(&mut tasks).await;

        Ok(())
    }

    /// Handle a single connection: read one request, dispatch it, write the
    /// response and close.
    ///
    /// Malformed requests are answered with `400` (`431` for oversized
    /// headers) before the parse error is returned. When the peer goes away
    /// or misses the read deadline nothing is written.
    pub async fn handle_connection<S>(socket: &mut S, router: &Router, config: &ServerConfig) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let read = read_request(socket, config.read_buffer_size, config.max_header_bytes);
        let read = tokio::time::timeout(config.read_timeout, read).await;

        let request = match read {
            Err(_) => {
                let _ = socket.shutdown().await;
                return Err(Error::Timeout);
            }
            Ok(Err(e)) if e.is_transport() => {
                let _ = socket.shutdown().await;
                return Err(Error::ParseError(e));
            }
            Ok(Err(e)) => {
                let status = match e {
                    ParserError::HeadersTooLarge(_) => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                let response = plain_text(status, format!("Error parsing request: {e}"));
                write_response(socket, &response, &config.server_name).await?;
                return Err(Error::ParseError(e));
            }
            Ok(Ok(request)) => request,
        };

        debug!("{} {}", request.method, request.url);
        let response = router.dispatch(request).await;
        write_response(socket, &response, &config.server_name).await?;

        Ok(())
    }
}
