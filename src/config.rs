//! Configuration for tyrant-cache
//!
//! Centralized configuration with sensible defaults. The client side is
//! described by [`Config`] and resolved into an immutable [`Endpoint`] when a
//! client is constructed; the loopback store is described by [`ServerConfig`].

use std::fmt;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default server address (Tokyo Tyrant's well-known port)
pub const DEFAULT_SERVER: &str = "127.0.0.1:1978";

/// Default I/O timeout for the cache path (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

// =============================================================================
// Client Configuration
// =============================================================================

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote store address as `host:port`
    pub server: String,

    /// Timeout applied to connect, send and receive (milliseconds)
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolve into an endpoint, validating the address and timeout
    pub fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::parse(&self.server, Duration::from_millis(self.timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the remote store address (`host:port`)
    pub fn server(mut self, addr: impl Into<String>) -> Self {
        self.config.server = addr.into();
        self
    }

    /// Set the I/O timeout (in milliseconds)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Endpoint
// =============================================================================

/// The fixed host/port/timeout triple a client connects to.
///
/// Immutable once built; reconnects always target the same endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    timeout: Duration,
}

impl Endpoint {
    /// Build an endpoint from already-split parts
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(CacheError::Config("empty host".to_string()));
        }
        if timeout.is_zero() {
            return Err(CacheError::Config("timeout must be non-zero".to_string()));
        }
        Ok(Self { host, port, timeout })
    }

    /// Parse a `host:port` string. IPv6 hosts must be bracketed (`[::1]:1978`).
    pub fn parse(addr: &str, timeout: Duration) -> Result<Self> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| CacheError::Config(format!("missing port in address '{}'", addr)))?;

        let host = match host.strip_prefix('[') {
            Some(inner) => inner.strip_suffix(']').ok_or_else(|| {
                CacheError::Config(format!("unterminated IPv6 host in '{}'", addr))
            })?,
            None if host.contains(':') => {
                return Err(CacheError::Config(format!(
                    "IPv6 host must be bracketed in '{}'",
                    addr
                )))
            }
            None => host,
        };

        let port: u16 = port
            .parse()
            .map_err(|_| CacheError::Config(format!("invalid port in address '{}'", addr)))?;

        Self::new(host, port, timeout)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Timeout applied uniformly to connect, send and receive
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

// =============================================================================
// Loopback Store Configuration
// =============================================================================

/// Configuration for the loopback store server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_SERVER.to_string(),
            max_connections: 1024,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Create a new server config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
