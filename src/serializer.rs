//! Value Serializer
//!
//! Converts in-process values to and from the opaque byte payloads stored
//! under each key. The wire codec never looks inside these payloads.
//!
//! ## Payload Format
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │ Tag (1)  │                 Body                    │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//! - 0x01: TEXT  - body is the UTF-8 bytes of the string, verbatim
//! - 0x02: VALUE - body is the bincode encoding of a [`Value`]
//!
//! Text takes the fast path so other clients reading the key see plain
//! UTF-8 after the tag, and so decoding never depends on a platform encoding.

use std::collections::BTreeMap;
use std::fmt;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::protocol::MAX_FIELD_SIZE;

/// Tag for UTF-8 text payloads
pub const TAG_TEXT: u8 = 0x01;

/// Tag for bincode-encoded payloads
pub const TAG_VALUE: u8 = 0x02;

/// Upper bound on a payload body; the tag byte fills the wire field
const MAX_BODY_SIZE: usize = MAX_FIELD_SIZE as usize - 1;

/// A cacheable value.
///
/// Mappings use a `BTreeMap` so that serializing the same value twice yields
/// identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Converts values to and from stored payloads.
///
/// Injected into [`crate::cache::Cache`] so the representation can be swapped
/// without touching the client or the codec.
pub trait ValueSerializer {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Value>;
}

/// Default serializer: UTF-8 fast path for text, bincode for everything else
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    pub fn new() -> Self {
        Self
    }

    fn options() -> impl Options {
        bincode::DefaultOptions::new()
            .with_limit(MAX_BODY_SIZE as u64)
            .reject_trailing_bytes()
    }
}

impl ValueSerializer for BincodeSerializer {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>> {
        if let Value::Text(text) = value {
            if text.len() > MAX_BODY_SIZE {
                return Err(CacheError::Serialization(format!(
                    "text of {} bytes exceeds {} byte limit",
                    text.len(),
                    MAX_BODY_SIZE
                )));
            }
            let mut out = Vec::with_capacity(1 + text.len());
            out.push(TAG_TEXT);
            out.extend_from_slice(text.as_bytes());
            return Ok(out);
        }

        let body = Self::options().serialize(value)?;
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(TAG_VALUE);
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value> {
        let (tag, body) = bytes
            .split_first()
            .ok_or_else(|| CacheError::Serialization("empty payload".to_string()))?;

        match *tag {
            TAG_TEXT => String::from_utf8(body.to_vec())
                .map(Value::Text)
                .map_err(|e| CacheError::Serialization(format!("invalid UTF-8 text: {}", e))),
            TAG_VALUE => Ok(Self::options().deserialize(body)?),
            other => Err(CacheError::Serialization(format!(
                "unknown payload tag: 0x{:02x}",
                other
            ))),
        }
    }
}
