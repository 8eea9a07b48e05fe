//! Loopback TCP Server
//!
//! Accepts connections and serves each one on its own thread against a
//! shared [`MemoryStore`]. Faults can be queued to exercise client recovery.

use std::collections::VecDeque;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use super::connection::Connection;
use crate::config::ServerConfig;
use crate::error::{CacheError, Result};
use crate::store::MemoryStore;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A misbehaviour applied to the next request received on any connection,
/// in place of executing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Close the connection without replying
    Disconnect,

    /// Reply with an unknown status byte and keep the connection open
    Garbage,

    /// Sleep, then close the connection without replying
    Stall(Duration),
}

/// FIFO of pending faults shared by all connections
#[derive(Debug, Default)]
pub struct FaultQueue {
    pending: Mutex<VecDeque<Fault>>,
}

impl FaultQueue {
    pub fn push(&self, fault: Fault) {
        self.pending.lock().push_back(fault);
    }

    pub fn pop(&self) -> Option<Fault> {
        self.pending.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// TCP server for the loopback store
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    store: Arc<MemoryStore>,
    faults: Arc<FaultQueue>,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listen address
    pub fn bind(config: ServerConfig, store: Arc<MemoryStore>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|source| {
            CacheError::Connect {
                addr: config.listen_addr.clone(),
                source,
            }
        })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config,
            listener,
            local_addr,
            store,
            faults: Arc::new(FaultQueue::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn faults(&self) -> Arc<FaultQueue> {
        Arc::clone(&self.faults)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        // Non-blocking accept so the shutdown flag is observed
        self.listener.set_nonblocking(true)?;
        tracing::info!("Listening on {}", self.local_addr);

        while !self.shutdown.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::error!("Accept failed on {}: {}", self.local_addr, e);
                    return Err(e.into());
                }
            }
        }

        tracing::info!("Server on {} stopped", self.local_addr);
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Run the accept loop on a background thread
    pub fn spawn(self) -> Result<ServerHandle> {
        let addr = self.local_addr;
        let store = Arc::clone(&self.store);
        let faults = Arc::clone(&self.faults);
        let shutdown = Arc::clone(&self.shutdown);

        let thread = thread::Builder::new()
            .name(format!("loopback-{}", addr.port()))
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            addr,
            store,
            faults,
            shutdown,
            thread: Some(thread),
        })
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        if self.active.load(Ordering::Acquire) >= self.config.max_connections {
            tracing::warn!("Rejecting {}: {} connections open", peer, self.config.max_connections);
            return;
        }

        // Accepted sockets inherit non-blocking mode on some platforms
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping {}: {}", peer, e);
            return;
        }

        let store = Arc::clone(&self.store);
        let faults = Arc::clone(&self.faults);
        let active = Arc::clone(&self.active);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        self.active.fetch_add(1, Ordering::AcqRel);
        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let result = Connection::new(stream, store, faults).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection {} ended with error: {}", peer, e);
                }
                active.fetch_sub(1, Ordering::AcqRel);
            });

        if let Err(e) = spawned {
            self.active.fetch_sub(1, Ordering::AcqRel);
            tracing::error!("Failed to spawn handler for {}: {}", peer, e);
        }
    }
}

/// Handle to a server running on a background thread
///
/// Dropping the handle stops the accept loop. Connections already being
/// served finish on their own when the client goes away.
pub struct ServerHandle {
    addr: SocketAddr,
    store: Arc<MemoryStore>,
    faults: Arc<FaultQueue>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// The table the server executes against
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Queue a fault for the next request received
    pub fn inject(&self, fault: Fault) {
        self.faults.push(fault);
    }

    /// Faults queued but not yet applied
    pub fn pending_faults(&self) -> usize {
        self.faults.len()
    }

    /// Stop the accept loop and wait for it to exit
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        match self.thread.take() {
            Some(thread) => thread.join().unwrap_or_else(|_| {
                Err(CacheError::Transport(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "accept loop panicked",
                )))
            }),
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("Server on {} stopped with error: {}", self.addr, e);
        }
    }
}
