//! Cache Facade
//!
//! Cache semantics on top of the resilient client: values go through an
//! injected [`ValueSerializer`], keys through [`CacheKey`], and expected
//! outcomes become quiet booleans and defaults. Connect, transport (after the
//! retry) and serialization failures still propagate.

use std::collections::HashMap;

use crate::client::Client;
use crate::config::Config;
use crate::error::Result;
use crate::key::CacheKey;
use crate::serializer::{BincodeSerializer, Value, ValueSerializer};

/// Cache backed by a single store connection
pub struct Cache<S = BincodeSerializer> {
    client: Client,
    serializer: S,
}

impl Cache<BincodeSerializer> {
    /// Connect with the default serializer
    pub fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(Client::connect(config)?, BincodeSerializer::new()))
    }
}

impl<S: ValueSerializer> Cache<S> {
    pub fn new(client: Client, serializer: S) -> Self {
        Self { client, serializer }
    }

    /// Store `value` only if `key` is not already cached.
    ///
    /// Returns whether the value was added.
    pub fn add<K: CacheKey + ?Sized>(&mut self, key: &K, value: &Value) -> Result<bool> {
        let payload = self.serializer.serialize(value)?;
        self.client.put_if_absent(&key.key_bytes(), &payload)
    }

    /// Fetch a value; `None` if the key is not cached
    pub fn get<K: CacheKey + ?Sized>(&mut self, key: &K) -> Result<Option<Value>> {
        match self.client.get(&key.key_bytes())? {
            Some(payload) => Ok(Some(self.serializer.deserialize(&payload)?)),
            None => Ok(None),
        }
    }

    /// Fetch a value, falling back to `default` if the key is not cached
    pub fn get_or<K: CacheKey + ?Sized>(&mut self, key: &K, default: Value) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Store a value, overwriting any existing one
    pub fn set<K: CacheKey + ?Sized>(&mut self, key: &K, value: &Value) -> Result<()> {
        let payload = self.serializer.serialize(value)?;
        self.client.put(&key.key_bytes(), &payload)
    }

    /// Remove a key; removing a key that is not cached is a no-op
    pub fn delete<K: CacheKey + ?Sized>(&mut self, key: &K) -> Result<()> {
        // Removal::NotFound counts as a successful delete
        self.client.remove(&key.key_bytes())?;
        Ok(())
    }

    /// Fetch several values in one round trip
    ///
    /// Keys that are not cached are absent from the map.
    pub fn get_many<K: CacheKey>(&mut self, keys: &[K]) -> Result<HashMap<String, Value>> {
        let raw: Vec<Vec<u8>> = keys.iter().map(|k| k.key_bytes()).collect();
        let records = self.client.get_many(raw.as_slice())?;

        let mut found = HashMap::with_capacity(records.len());
        for (key, payload) in records {
            let value = self.serializer.deserialize(&payload)?;
            found.insert(String::from_utf8_lossy(&key).into_owned(), value);
        }
        Ok(found)
    }

    /// Store several values.
    ///
    /// This is a loop of individual `set` calls, one round trip each, and is
    /// not atomic: if one fails, the entries before it stay set and the rest
    /// are not attempted.
    pub fn set_many<K, I>(&mut self, entries: I) -> Result<()>
    where
        K: CacheKey,
        I: IntoIterator<Item = (K, Value)>,
    {
        for (key, value) in entries {
            self.set(&key, &value)?;
        }
        Ok(())
    }

    /// Atomically add `delta` to the counter at `key`.
    ///
    /// A missing key starts from zero. Returns `None` if the key holds a
    /// value that is not a counter (anything written with `set` or `add`).
    pub fn incr<K: CacheKey + ?Sized>(&mut self, key: &K, delta: i32) -> Result<Option<i32>> {
        Ok(self.client.increment(&key.key_bytes(), delta)?.value())
    }

    /// `incr` by one, the usual hit-counter step
    pub fn incr_one<K: CacheKey + ?Sized>(&mut self, key: &K) -> Result<Option<i32>> {
        self.incr(key, 1)
    }

    /// Drop every cached key
    pub fn flush(&mut self) -> Result<()> {
        self.client.clear()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    pub fn into_client(self) -> Client {
        self.client
    }
}
