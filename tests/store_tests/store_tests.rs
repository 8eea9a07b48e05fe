//! Tests for the loopback MemoryStore
//!
//! These tests verify the store answers each command the way the remote
//! store does, since every client test runs against it.

use tyrant_cache::protocol::{Command, Response, ResponseBody, Status};
use tyrant_cache::store::MemoryStore;

fn put(store: &MemoryStore, key: &[u8], value: &[u8]) -> Response {
    store.execute(Command::Put {
        key: key.to_vec(),
        value: value.to_vec(),
    })
}

#[test]
fn test_put_get() {
    let store = MemoryStore::new();

    assert_eq!(put(&store, b"hello", b"world"), Response::ok());
    let result = store.execute(Command::Get {
        key: b"hello".to_vec(),
    });

    assert_eq!(result, Response::value(b"world".to_vec()));
}

#[test]
fn test_get_missing_is_refused() {
    let store = MemoryStore::new();
    let result = store.execute(Command::Get {
        key: b"missing".to_vec(),
    });
    assert_eq!(result.status, Status::Refused);
}

#[test]
fn test_put_overwrites() {
    let store = MemoryStore::new();
    put(&store, b"key", b"value1");
    put(&store, b"key", b"value2");
    assert_eq!(store.get(b"key"), Some(b"value2".to_vec()));
}

#[test]
fn test_put_if_absent_keeps_first_value() {
    let store = MemoryStore::new();

    let first = store.execute(Command::PutIfAbsent {
        key: b"k".to_vec(),
        value: b"v1".to_vec(),
    });
    let second = store.execute(Command::PutIfAbsent {
        key: b"k".to_vec(),
        value: b"v2".to_vec(),
    });

    assert_eq!(first.status, Status::Ok);
    assert_eq!(second.status, Status::Refused);
    assert_eq!(store.get(b"k"), Some(b"v1".to_vec()));
}

#[test]
fn test_remove() {
    let store = MemoryStore::new();
    put(&store, b"key", b"value");

    let removed = store.execute(Command::Remove { key: b"key".to_vec() });
    let again = store.execute(Command::Remove { key: b"key".to_vec() });

    assert_eq!(removed.status, Status::Ok);
    assert_eq!(again.status, Status::Refused);
    assert!(store.is_empty());
}

#[test]
fn test_get_many_omits_missing_keys() {
    let store = MemoryStore::new();
    put(&store, b"k1", b"v1");
    put(&store, b"k3", b"v3");

    let result = store.execute(Command::GetMany {
        keys: vec![b"k1".to_vec(), b"k2".to_vec(), b"k3".to_vec()],
    });

    assert_eq!(
        result.body,
        ResponseBody::Records(vec![
            (b"k1".to_vec(), b"v1".to_vec()),
            (b"k3".to_vec(), b"v3".to_vec()),
        ])
    );
}

#[test]
fn test_increment_from_missing_key() {
    let store = MemoryStore::new();
    assert_eq!(store.increment(b"n".to_vec(), 5), Some(5));
    assert_eq!(store.increment(b"n".to_vec(), 3), Some(8));
    assert_eq!(store.increment(b"n".to_vec(), -10), Some(-2));
    assert_eq!(store.get(b"n"), Some((-2i32).to_le_bytes().to_vec()));
}

#[test]
fn test_increment_rejects_non_counter() {
    let store = MemoryStore::new();
    put(&store, b"text", b"not a number");

    let result = store.execute(Command::Increment {
        key: b"text".to_vec(),
        delta: 1,
    });

    assert_eq!(result.status, Status::Refused);
    assert_eq!(store.get(b"text"), Some(b"not a number".to_vec()));
}

#[test]
fn test_increment_rejects_overflow() {
    let store = MemoryStore::new();
    store.increment(b"n".to_vec(), i32::MAX);
    assert_eq!(store.increment(b"n".to_vec(), 1), None);
    assert_eq!(store.increment(b"n".to_vec(), 0), Some(i32::MAX));
}

#[test]
fn test_clear() {
    let store = MemoryStore::new();
    put(&store, b"a", b"1");
    put(&store, b"b", b"2");
    assert_eq!(store.len(), 2);

    assert_eq!(store.execute(Command::Clear), Response::ok());
    assert!(store.is_empty());
}
