//! Network Module
//!
//! TCP transport for both ends of the protocol.
//!
//! ## Architecture
//! - `Session`: the client's single connection to the store
//! - `Server` / `Connection`: the loopback store, one thread per connection

mod session;
mod server;
mod connection;

pub use session::Session;
pub use server::{Fault, FaultQueue, Server, ServerHandle};
pub use connection::Connection;
