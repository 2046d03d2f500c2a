//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::parser::DEFAULT_MAX_HEADER_BYTES;
use crate::server::error::Error;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// How many bytes to read from a socket at a time.
    pub read_buffer_size: usize,
    /// Upper bound on the request line plus headers.
    pub max_header_bytes: usize,
    /// How long a connection may take to deliver its request.
    pub read_timeout: Duration,
    /// Value of the `Server` response header.
    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_connections: 1024,
            read_buffer_size: 4096,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            read_timeout: Duration::from_secs(30),
            server_name: "Droplet".to_string(),
        }
    }
}

impl ServerConfig {
    /// Check that the configuration can serve requests.
    pub fn validate(&self) -> Result<(), Error> {
        if self.read_buffer_size == 0 {
            return Err(Error::InvalidConfig("read_buffer_size must be positive".to_string()));
        }
        if self.max_connections == 0 {
            return Err(Error::InvalidConfig("max_connections must be positive".to_string()));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::InvalidConfig("read_timeout must be positive".to_string()));
        }
        Ok(())
    }
}
