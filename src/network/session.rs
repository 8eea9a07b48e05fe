//! Transport Session
//!
//! One live TCP connection to the store, with the endpoint timeout applied
//! to connect, read and write, and Nagle's algorithm disabled.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use crate::config::Endpoint;
use crate::error::{CacheError, Result};
use crate::protocol::{read_response, write_command, Command, CommandType, Response};

/// A single connection to the store
///
/// Strictly request/response: one frame out, one frame back. A session that
/// has seen any I/O or protocol failure must be dropped, not reused; the
/// stream may be mid-frame.
pub struct Session {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Remote address actually connected to
    peer_addr: SocketAddr,
}

impl Session {
    /// Connect to the endpoint
    ///
    /// Tries every address the host resolves to, in order. Any failure,
    /// including applying socket options, is a connect error.
    pub fn open(endpoint: &Endpoint) -> Result<Self> {
        let connect_err = |source: std::io::Error| CacheError::Connect {
            addr: endpoint.to_string(),
            source,
        };

        let addrs = (endpoint.host(), endpoint.port())
            .to_socket_addrs()
            .map_err(connect_err)?;

        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, endpoint.timeout()) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        let stream = match stream {
            Some(s) => s,
            None => {
                return Err(connect_err(last_err.unwrap_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "host resolved to no addresses",
                    )
                })))
            }
        };

        Self::configure(stream, endpoint).map_err(connect_err)
    }

    fn configure(stream: TcpStream, endpoint: &Endpoint) -> std::io::Result<Self> {
        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(endpoint.timeout()))?;
        stream.set_write_timeout(Some(endpoint.timeout()))?;

        let peer_addr = stream.peer_addr()?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("Session opened to {} ({})", endpoint, peer_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            peer_addr,
        })
    }

    /// Send one request frame
    pub fn send(&mut self, command: &Command) -> Result<()> {
        write_command(&mut self.writer, command)
    }

    /// Receive the response to a command of the given type
    ///
    /// A timed-out or truncated read is a transport error.
    pub fn receive(&mut self, kind: CommandType) -> Result<Response> {
        read_response(&mut self.reader, kind)
    }

    /// Send a request and wait for its response
    pub fn request(&mut self, command: &Command) -> Result<Response> {
        let kind = command.command_type();
        tracing::trace!("-> {} to {}", kind.name(), self.peer_addr);

        self.send(command)?;
        let response = self.receive(kind)?;

        tracing::trace!("<- {} {:?}", kind.name(), response.status);
        Ok(response)
    }

    /// Shut the socket down in both directions
    ///
    /// Dropping the session also releases the socket; this makes the peer see
    /// the close immediately.
    pub fn close(self) {
        if let Err(e) = self.writer.get_ref().shutdown(Shutdown::Both) {
            tracing::trace!("Shutdown of {} failed: {}", self.peer_addr, e);
        }
    }

    /// Get the connected peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Whether Nagle's algorithm is disabled on the socket
    pub fn nodelay(&self) -> Result<bool> {
        Ok(self.writer.get_ref().nodelay()?)
    }
}
