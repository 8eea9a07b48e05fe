//! # tyrant-cache
//!
//! A cache client for stores speaking the Tokyo Tyrant binary protocol:
//! - Binary, length-prefixed request/response codec
//! - One TCP session per client, no pipelining
//! - Transparent reconnect-and-retry (exactly once) on transport failure
//! - Pluggable value serialization with a UTF-8 text fast path
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Cache                                 │
//! │           (add/get/set/delete/incr/flush/…)                  │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//!   ┌─────────────────────────┐      ┌────────────────────┐
//!   │     Resilient Client    │      │  ValueSerializer   │
//!   │ (reconnect + retry ×1)  │      │ (text / bincode)   │
//!   └────────────┬────────────┘      └────────────────────┘
//!                │
//!                ▼
//!   ┌─────────────────────────┐
//!   │        Session          │
//!   │  (TCP, timeout, nodelay)│
//!   └────────────┬────────────┘
//!                │  protocol frames
//!                ▼
//!   ┌─────────────────────────┐
//!   │  Store (ttserver, or    │
//!   │  the loopback Server)   │
//!   └─────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use tyrant_cache::{Cache, Config, Value};
//!
//! # fn main() -> tyrant_cache::Result<()> {
//! let config = Config::builder().server("127.0.0.1:1978").timeout_ms(500).build();
//! let mut cache = Cache::connect(&config)?;
//!
//! cache.set("greeting", &Value::from("héllo"))?;
//! assert_eq!(cache.get("greeting")?, Some(Value::from("héllo")));
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod serializer;
pub mod key;
pub mod client;
pub mod cache;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CacheError, Result};
pub use config::{Config, Endpoint, ServerConfig};
pub use client::{Client, Increment, Removal};
pub use cache::Cache;
pub use key::CacheKey;
pub use serializer::{BincodeSerializer, Value, ValueSerializer};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tyrant-cache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
