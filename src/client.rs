//! Resilient Client
//!
//! One session to the store, with a single reconnect-and-retry on failure.
//!
//! ## Recovery Model
//!
//! Every operation runs through [`Client::with_reconnect`]:
//! 1. Attempt the request on the current session
//! 2. On a transport or protocol failure, drop the session (closing the
//!    socket), open a fresh one against the same endpoint, and attempt once more
//! 3. A second failure goes back to the caller
//!
//! There is no backoff and no further retry: a cache that is down should fail
//! fast rather than block the request path. Expected outcomes (missing key,
//! existing key, non-counter value) are successful responses as far as this
//! layer is concerned and are never retried.
//!
//! The client is not internally synchronized. Operations take `&mut self`;
//! concurrent callers each need their own client.

use crate::config::{Config, Endpoint};
use crate::error::{CacheError, Result};
use crate::network::Session;
use crate::protocol::{check_command, Command, Response, ResponseBody, Status};

/// Outcome of a remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    NotFound,
}

/// Outcome of an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    /// The counter's new value
    Applied(i32),

    /// The stored value is not a counter, or the add would overflow
    Rejected,
}

impl Increment {
    pub fn value(self) -> Option<i32> {
        match self {
            Increment::Applied(n) => Some(n),
            Increment::Rejected => None,
        }
    }
}

/// Client for one store endpoint
pub struct Client {
    endpoint: Endpoint,

    /// `None` only after a failed recovery; reopened lazily
    session: Option<Session>,
}

impl Client {
    /// Connect using a config
    ///
    /// Fails if the address is malformed or the first session cannot be
    /// opened. Neither is retried.
    pub fn connect(config: &Config) -> Result<Self> {
        Self::connect_endpoint(config.endpoint()?)
    }

    /// Connect to an already-parsed endpoint
    pub fn connect_endpoint(endpoint: Endpoint) -> Result<Self> {
        let session = Session::open(&endpoint)?;
        tracing::debug!("Client connected to {}", endpoint);
        Ok(Self {
            endpoint,
            session: Some(session),
        })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Unconditionally store a value
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let command = Command::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        let response = self.execute(&command)?;
        expect_ok(&response, "put")
    }

    /// Store a value only if the key is absent
    ///
    /// Returns whether the value was added.
    pub fn put_if_absent(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        let command = Command::PutIfAbsent {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        Ok(self.execute(&command)?.is_ok())
    }

    /// Fetch a value; `None` if the key is missing
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let command = Command::Get { key: key.to_vec() };
        match self.execute(&command)? {
            Response {
                status: Status::Ok,
                body: ResponseBody::Value(value),
            } => Ok(Some(value)),
            Response {
                status: Status::Refused,
                ..
            } => Ok(None),
            other => Err(unexpected(&other, "get")),
        }
    }

    /// Fetch several values
    ///
    /// Only keys that exist appear in the result.
    pub fn get_many<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let command = Command::GetMany {
            keys: keys.iter().map(|k| k.as_ref().to_vec()).collect(),
        };
        match self.execute(&command)? {
            Response {
                status: Status::Ok,
                body: ResponseBody::Records(records),
            } => Ok(records),
            Response {
                status: Status::Refused,
                ..
            } => Ok(Vec::new()),
            other => Err(unexpected(&other, "get_many")),
        }
    }

    /// Remove a key; a missing key is not an error
    pub fn remove(&mut self, key: &[u8]) -> Result<Removal> {
        let command = Command::Remove { key: key.to_vec() };
        if self.execute(&command)?.is_ok() {
            Ok(Removal::Removed)
        } else {
            Ok(Removal::NotFound)
        }
    }

    /// Atomically add `delta` to the counter at `key`
    ///
    /// A missing key counts as zero.
    pub fn increment(&mut self, key: &[u8], delta: i32) -> Result<Increment> {
        let command = Command::Increment {
            key: key.to_vec(),
            delta,
        };
        match self.execute(&command)? {
            Response {
                status: Status::Ok,
                body: ResponseBody::Number(n),
            } => Ok(Increment::Applied(n)),
            Response {
                status: Status::Refused,
                ..
            } => Ok(Increment::Rejected),
            other => Err(unexpected(&other, "increment")),
        }
    }

    /// Drop every key in the store
    pub fn clear(&mut self) -> Result<()> {
        let response = self.execute(&Command::Clear)?;
        expect_ok(&response, "clear")
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Send a command through the retry wrapper
    ///
    /// A command over the wire limits fails with [`CacheError::Oversized`]
    /// before anything is written; the session is left untouched.
    pub fn execute(&mut self, command: &Command) -> Result<Response> {
        check_command(command)?;
        self.with_reconnect(|session| session.request(command))
    }

    /// Run `op` against the session, reconnecting and retrying exactly once
    /// if it fails with a recoverable error
    ///
    /// The session is kept after any other error, so `op` must report every
    /// failure that can leave a partial frame on the socket as
    /// [`CacheError::Transport`] or [`CacheError::Protocol`]. Errors from
    /// [`Session`] methods already do.
    pub fn with_reconnect<T, F>(&mut self, mut op: F) -> Result<T>
    where
        F: FnMut(&mut Session) -> Result<T>,
    {
        match self.attempt(&mut op) {
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Request to {} failed ({}), reconnecting", self.endpoint, e);
                self.reconnect()?;
                self.attempt(&mut op).map_err(|e| {
                    tracing::warn!("Retry to {} failed: {}", self.endpoint, e);
                    e
                })
            }
            result => result,
        }
    }

    /// One attempt; a recoverable failure discards the session
    fn attempt<T, F>(&mut self, op: &mut F) -> Result<T>
    where
        F: FnMut(&mut Session) -> Result<T>,
    {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => Session::open(&self.endpoint)?,
        };

        let result = op(&mut session);
        match result {
            Err(ref e) if e.is_recoverable() => session.close(),
            _ => self.session = Some(session),
        }
        result
    }

    /// Replace the session with a freshly opened one
    pub fn reconnect(&mut self) -> Result<()> {
        self.discard();
        self.session = Some(Session::open(&self.endpoint)?);
        tracing::debug!("Reconnected to {}", self.endpoint);
        Ok(())
    }

    fn discard(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The endpoint every session targets
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Whether a session is currently held
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// The current session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.discard();
    }
}

fn expect_ok(response: &Response, op: &str) -> Result<()> {
    if response.is_ok() {
        Ok(())
    } else {
        Err(unexpected(response, op))
    }
}

/// A well-formed frame the operation never produces. The store is not
/// misbehaving at the transport level, so this is not retried.
fn unexpected(response: &Response, op: &str) -> CacheError {
    CacheError::Protocol(format!(
        "unexpected {:?} response to {}",
        response.status, op
    ))
}
