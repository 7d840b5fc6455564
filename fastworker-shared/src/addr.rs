//! # Address Parsing
//!
//! Base addresses are of the form `scheme://host:port`, e.g.
//! `tcp://127.0.0.1:5555`. Endpoints are derived by adding a port offset to
//! a role's base port.

use crate::error::{FastworkerError, FastworkerResult};
use crate::models::TaskPriority;

/// A parsed `scheme://host:port` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseAddress {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl BaseAddress {
    pub fn parse(address: &str) -> FastworkerResult<Self> {
        let (scheme, rest) = address.split_once("://").ok_or_else(|| {
            FastworkerError::invalid_address(address, "missing scheme separator `://`")
        })?;
        let (host, port) = rest.rsplit_once(':').ok_or_else(|| {
            FastworkerError::invalid_address(address, "missing host:port separator")
        })?;
        let port: u16 = port
            .parse()
            .map_err(|_| FastworkerError::invalid_address(address, "port is not a valid u16"))?;
        if host.is_empty() {
            return Err(FastworkerError::invalid_address(address, "empty host"));
        }
        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
        })
    }

    /// Render `scheme://host:port` with `port` replaced by `base_port + offset`.
    pub fn endpoint(&self, offset: u16) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port + offset)
    }

    /// Render the endpoint for submissions of the given priority.
    pub fn priority_endpoint(&self, priority: TaskPriority) -> String {
        self.endpoint(priority.port_offset())
    }

    /// `host:port` for `base_port + offset`, suitable for `TcpStream::connect`.
    pub fn socket_addr_with_offset(&self, offset: u16) -> String {
        format!("{}:{}", self.host, self.port + offset)
    }

    /// `host:port` for the submission endpoint of the given priority.
    pub fn priority_socket_addr(&self, priority: TaskPriority) -> String {
        self.socket_addr_with_offset(priority.port_offset())
    }

    /// The socket address portion (`host:port`), suitable for `TcpListener::bind`
    /// or `TcpStream::connect`.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
