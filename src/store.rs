//! Loopback Store
//!
//! An in-memory table that executes protocol commands with the same
//! semantics as the remote store. Backs the loopback server used in tests,
//! benchmarks and local development.
//!
//! ## Semantics
//! - PUTKEEP refuses when the key exists
//! - OUT and GET refuse when the key is missing
//! - MGET returns only the keys that exist, in request order
//! - ADDINT treats a missing key as 0 and stores the sum as a 4-byte
//!   little-endian integer; it refuses non-counter values and overflow

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::protocol::{Command, Response};

/// In-memory key-value table
pub struct MemoryStore {
    data: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Response {
        match command {
            Command::Put { key, value } => {
                self.put(key, value);
                Response::ok()
            }
            Command::PutIfAbsent { key, value } => {
                if self.put_if_absent(key, value) {
                    Response::ok()
                } else {
                    Response::refused()
                }
            }
            Command::Remove { key } => {
                if self.remove(&key) {
                    Response::ok()
                } else {
                    Response::refused()
                }
            }
            Command::Get { key } => match self.get(&key) {
                Some(value) => Response::value(value),
                None => Response::refused(),
            },
            Command::GetMany { keys } => Response::records(self.get_many(&keys)),
            Command::Increment { key, delta } => match self.increment(key, delta) {
                Some(sum) => Response::number(sum),
                None => Response::refused(),
            },
            Command::Clear => {
                self.clear();
                Response::ok()
            }
        }
    }

    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.data.lock().insert(key, value);
    }

    /// Returns false if the key already exists
    pub fn put_if_absent(&self, key: Vec<u8>, value: Vec<u8>) -> bool {
        let mut data = self.data.lock();
        if data.contains_key(&key) {
            return false;
        }
        data.insert(key, value);
        true
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.lock().get(key).cloned()
    }

    pub fn get_many(&self, keys: &[Vec<u8>]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let data = self.data.lock();
        keys.iter()
            .filter_map(|k| data.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }

    /// Returns false if the key was missing
    pub fn remove(&self, key: &[u8]) -> bool {
        self.data.lock().remove(key).is_some()
    }

    /// Returns the new value, or None if the stored value is not a counter
    /// or the add overflows
    pub fn increment(&self, key: Vec<u8>, delta: i32) -> Option<i32> {
        let mut data = self.data.lock();
        let current = match data.get(&key) {
            Some(bytes) => i32::from_le_bytes(bytes.as_slice().try_into().ok()?),
            None => 0,
        };
        let sum = current.checked_add(delta)?;
        data.insert(key, sum.to_le_bytes().to_vec());
        Some(sum)
    }

    pub fn clear(&self) {
        self.data.lock().clear();
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
