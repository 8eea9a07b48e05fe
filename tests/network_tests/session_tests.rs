//! Tests for the Transport Session
//!
//! These tests verify:
//! - Socket configuration (nodelay, timeout)
//! - Request/response round trips
//! - Failures surface as the right error class

use std::io::Read;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tyrant_cache::network::{Server, ServerHandle, Session};
use tyrant_cache::protocol::{Command, CommandType, Response};
use tyrant_cache::store::MemoryStore;
use tyrant_cache::{CacheError, Endpoint, ServerConfig};

// =============================================================================
// Helper Functions
// =============================================================================

fn spawn_server() -> ServerHandle {
    let config = ServerConfig::builder().listen_addr("127.0.0.1:0").build();
    Server::bind(config, Arc::new(MemoryStore::new()))
        .unwrap()
        .spawn()
        .unwrap()
}

fn endpoint_for(port: u16, timeout_ms: u64) -> Endpoint {
    Endpoint::new("127.0.0.1", port, Duration::from_millis(timeout_ms)).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_open_sets_nodelay() {
    let server = spawn_server();
    let session = Session::open(&endpoint_for(server.local_addr().port(), 500)).unwrap();

    assert!(session.nodelay().unwrap());
    assert_eq!(session.peer_addr(), server.local_addr());
}

#[test]
fn test_request_roundtrip() {
    let server = spawn_server();
    let mut session = Session::open(&endpoint_for(server.local_addr().port(), 500)).unwrap();

    let put = session
        .request(&Command::Put {
            key: b"k".to_vec(),
            value: b"v".to_vec(),
        })
        .unwrap();
    let get = session.request(&Command::Get { key: b"k".to_vec() }).unwrap();

    assert_eq!(put, Response::ok());
    assert_eq!(get, Response::value(b"v".to_vec()));
}

#[test]
fn test_send_then_receive() {
    let server = spawn_server();
    let mut session = Session::open(&endpoint_for(server.local_addr().port(), 500)).unwrap();

    session
        .send(&Command::Increment {
            key: b"n".to_vec(),
            delta: 4,
        })
        .unwrap();
    let response = session.receive(CommandType::Increment).unwrap();

    assert_eq!(response, Response::number(4));
}

#[test]
fn test_open_refused_is_connect_error() {
    // Bind then drop to get a port nobody is listening on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = Session::open(&endpoint_for(port, 200));
    assert!(matches!(result, Err(CacheError::Connect { .. })));
}

#[test]
fn test_silent_peer_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    // Accept, swallow the request, never answer
    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 64];
        let _ = stream.read(&mut buf);
        thread::sleep(Duration::from_millis(500));
    });

    let mut session = Session::open(&endpoint_for(port, 100)).unwrap();
    let started = Instant::now();
    let result = session.request(&Command::Get { key: b"k".to_vec() });

    let err = result.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
    assert!(err.is_recoverable());
    assert!(started.elapsed() < Duration::from_millis(450));

    peer.join().unwrap();
}

#[test]
fn test_peer_close_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let peer = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });

    let mut session = Session::open(&endpoint_for(port, 500)).unwrap();
    peer.join().unwrap();

    let result = session.request(&Command::Get { key: b"k".to_vec() });
    assert!(matches!(result, Err(CacheError::Transport(_))));
}

#[test]
fn test_close_is_seen_by_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut buf = [0u8; 8];
        stream.read(&mut buf).unwrap()
    });

    let session = Session::open(&endpoint_for(port, 500)).unwrap();
    session.close();

    // EOF rather than a timeout
    assert_eq!(peer.join().unwrap(), 0);
}
