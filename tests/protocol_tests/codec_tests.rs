//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;
use tyrant_cache::protocol::{
    check_command, decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, CommandType, Response, ResponseBody,
    Status, MAX_FIELD_SIZE, MAX_RECORDS,
};
use tyrant_cache::CacheError;

// =============================================================================
// Frame Layout Tests
// =============================================================================

#[test]
fn test_put_frame_layout() {
    let cmd = Command::Put {
        key: b"ab".to_vec(),
        value: b"xyz".to_vec(),
    };
    let encoded = encode_command(&cmd);

    assert_eq!(
        &encoded[..],
        &[0xC8, 0x10, 0, 0, 0, 2, 0, 0, 0, 3, b'a', b'b', b'x', b'y', b'z']
    );
}

#[test]
fn test_increment_frame_layout() {
    let cmd = Command::Increment {
        key: b"n".to_vec(),
        delta: -2,
    };
    let encoded = encode_command(&cmd);

    assert_eq!(
        &encoded[..],
        &[0xC8, 0x60, 0, 0, 0, 1, 0xFF, 0xFF, 0xFF, 0xFE, b'n']
    );
}

#[test]
fn test_get_many_frame_layout() {
    let cmd = Command::GetMany {
        keys: vec![b"a".to_vec(), b"bc".to_vec()],
    };
    let encoded = encode_command(&cmd);

    assert_eq!(
        &encoded[..],
        &[0xC8, 0x31, 0, 0, 0, 2, 0, 0, 0, 1, b'a', 0, 0, 0, 2, b'b', b'c']
    );
}

#[test]
fn test_clear_frame_layout() {
    assert_eq!(&encode_command(&Command::Clear)[..], &[0xC8, 0x72]);
}

#[test]
fn test_opcodes() {
    assert_eq!(CommandType::Put as u8, 0x10);
    assert_eq!(CommandType::PutIfAbsent as u8, 0x11);
    assert_eq!(CommandType::Remove as u8, 0x20);
    assert_eq!(CommandType::Get as u8, 0x30);
    assert_eq!(CommandType::GetMany as u8, 0x31);
    assert_eq!(CommandType::Increment as u8, 0x60);
    assert_eq!(CommandType::Clear as u8, 0x72);
    assert_eq!(CommandType::from_opcode(0x31), Some(CommandType::GetMany));
    assert_eq!(CommandType::from_opcode(0x99), None);
}

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_every_command() {
    let commands = vec![
        Command::Put {
            key: b"mykey".to_vec(),
            value: b"myvalue".to_vec(),
        },
        Command::PutIfAbsent {
            key: b"k".to_vec(),
            value: b"v".to_vec(),
        },
        Command::Remove {
            key: b"todelete".to_vec(),
        },
        Command::Get {
            key: b"hello".to_vec(),
        },
        Command::GetMany {
            keys: vec![b"k1".to_vec(), b"k2".to_vec(), b"k3".to_vec()],
        },
        Command::Increment {
            key: b"counter".to_vec(),
            delta: 5,
        },
        Command::Clear,
    ];

    for cmd in commands {
        let decoded = decode_command(&encode_command(&cmd)).unwrap();
        assert_eq!(decoded, cmd);
    }
}

#[test]
fn test_encode_decode_empty_key_and_value() {
    let cmd = Command::Put {
        key: vec![],
        value: vec![],
    };
    let decoded = decode_command(&encode_command(&cmd)).unwrap();

    match decoded {
        Command::Put { key, value } => {
            assert!(key.is_empty());
            assert!(value.is_empty());
        }
        _ => panic!("Expected PUT command"),
    }
}

#[test]
fn test_encode_decode_binary_data() {
    // Test with binary data containing null bytes and high bytes
    let binary_key: Vec<u8> = vec![0x00, 0x01, 0xFF, 0xFE, 0x80];
    let binary_value: Vec<u8> = (0..=255).collect();

    let cmd = Command::Put {
        key: binary_key.clone(),
        value: binary_value.clone(),
    };
    let decoded = decode_command(&encode_command(&cmd)).unwrap();

    match decoded {
        Command::Put { key, value } => {
            assert_eq!(key, binary_key);
            assert_eq!(value, binary_value);
        }
        _ => panic!("Expected PUT command"),
    }
}

#[test]
fn test_encode_decode_empty_get_many() {
    let cmd = Command::GetMany { keys: vec![] };
    let decoded = decode_command(&encode_command(&cmd)).unwrap();
    assert_eq!(decoded, cmd);
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_response_value() {
    let resp = Response::value(b"value".to_vec());
    let encoded = encode_response(&resp);
    assert_eq!(&encoded[..], &[0x00, 0, 0, 0, 5, b'v', b'a', b'l', b'u', b'e']);

    let decoded = decode_response(&encoded, CommandType::Get).unwrap();
    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.body, ResponseBody::Value(b"value".to_vec()));
}

#[test]
fn test_encode_decode_response_records() {
    let resp = Response::records(vec![
        (b"k1".to_vec(), b"v1".to_vec()),
        (b"k3".to_vec(), b"".to_vec()),
    ]);
    let decoded = decode_response(&encode_response(&resp), CommandType::GetMany).unwrap();
    assert_eq!(decoded, resp);
}

#[test]
fn test_encode_decode_response_number() {
    let resp = Response::number(-42);
    let decoded = decode_response(&encode_response(&resp), CommandType::Increment).unwrap();
    assert_eq!(decoded.body, ResponseBody::Number(-42));
}

#[test]
fn test_status_only_responses() {
    for kind in [
        CommandType::Put,
        CommandType::PutIfAbsent,
        CommandType::Remove,
        CommandType::Clear,
    ] {
        let decoded = decode_response(&[0x00], kind).unwrap();
        assert_eq!(decoded, Response::ok());
    }
}

#[test]
fn test_refused_response_has_no_body() {
    let encoded = encode_response(&Response::refused());
    assert_eq!(&encoded[..], &[0x01]);

    // Same single byte decodes as refused for every command type
    for kind in [CommandType::Get, CommandType::GetMany, CommandType::Increment] {
        let decoded = decode_response(&encoded, kind).unwrap();
        assert_eq!(decoded.status, Status::Refused);
        assert_eq!(decoded.body, ResponseBody::Empty);
    }
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_incomplete_frame() {
    let bytes = [0xC8, 0x30, 0x00, 0x00]; // key length cut short
    let result = decode_command(&bytes);
    assert!(matches!(result, Err(CacheError::Protocol(_))));
    assert!(result.unwrap_err().to_string().contains("Incomplete"));
}

#[test]
fn test_incomplete_key() {
    // Header says 10 byte key, only 1 provided
    let bytes = [0xC8, 0x30, 0x00, 0x00, 0x00, 0x0A, b'h'];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("Incomplete"));
}

#[test]
fn test_unknown_magic() {
    let bytes = [0xC9, 0x30, 0x00, 0x00, 0x00, 0x00];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("Unknown magic"));
}

#[test]
fn test_unknown_command_type() {
    let bytes = [0xC8, 0xFF];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("Unknown command type"));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut bytes = encode_command(&Command::Clear).to_vec();
    bytes.push(0x00);
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("Trailing"));
}

#[test]
fn test_oversized_field_rejected() {
    let len = (MAX_FIELD_SIZE + 1).to_be_bytes();
    let bytes = [0xC8, 0x30, len[0], len[1], len[2], len[3]];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("too large"));
}

#[test]
fn test_check_rejects_oversized_value() {
    let command = Command::Put {
        key: b"k".to_vec(),
        value: vec![0u8; MAX_FIELD_SIZE as usize + 1],
    };
    match check_command(&command) {
        Err(CacheError::Oversized(msg)) => assert!(msg.contains("value")),
        other => panic!("Expected oversized error, got {:?}", other),
    }
}

#[test]
fn test_check_accepts_what_the_decoder_accepts() {
    let command = Command::Put {
        key: b"k".to_vec(),
        value: vec![0u8; MAX_FIELD_SIZE as usize],
    };
    check_command(&command).unwrap();
    assert_eq!(decode_command(&encode_command(&command)).unwrap(), command);
}

#[test]
fn test_check_rejects_too_many_keys() {
    let command = Command::GetMany {
        keys: vec![Vec::new(); MAX_RECORDS as usize + 1],
    };
    assert!(matches!(
        check_command(&command),
        Err(CacheError::Oversized(_))
    ));
    check_command(&Command::Clear).unwrap();
}

#[test]
fn test_unknown_status_is_protocol_error() {
    let result = decode_response(&[0x7F], CommandType::Get);
    match result {
        Err(CacheError::Protocol(msg)) => assert!(msg.contains("Unknown response status")),
        other => panic!("Expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_unknown_status_is_not_not_found() {
    // A not-found get decodes fine; an unknown status must not look like one
    assert!(decode_response(&[0x01], CommandType::Get).is_ok());
    assert!(decode_response(&[0x02], CommandType::Get).is_err());
}

#[test]
fn test_truncated_response_body() {
    let result = decode_response(&[0x00, 0x00, 0x00, 0x00, 0x05, b'a'], CommandType::Get);
    assert!(matches!(result, Err(CacheError::Protocol(_))));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_command_sequence() {
    let mut buf = Vec::new();
    write_command(&mut buf, &Command::Get { key: b"a".to_vec() }).unwrap();
    write_command(&mut buf, &Command::Clear).unwrap();

    let mut reader = Cursor::new(buf);
    assert_eq!(
        read_command(&mut reader).unwrap(),
        Command::Get { key: b"a".to_vec() }
    );
    assert_eq!(read_command(&mut reader).unwrap(), Command::Clear);
}

#[test]
fn test_stream_response_sequence() {
    let mut buf = Vec::new();
    write_response(&mut buf, &Response::number(8)).unwrap();
    write_response(&mut buf, &Response::refused()).unwrap();

    let mut reader = Cursor::new(buf);
    assert_eq!(
        read_response(&mut reader, CommandType::Increment).unwrap(),
        Response::number(8)
    );
    assert_eq!(
        read_response(&mut reader, CommandType::Get).unwrap(),
        Response::refused()
    );
}

#[test]
fn test_truncated_stream_is_transport_error() {
    let mut reader = Cursor::new(vec![0x00, 0x00, 0x00]);
    let result = read_response(&mut reader, CommandType::Get);
    match result {
        Err(CacheError::Transport(e)) => {
            assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof)
        }
        other => panic!("Expected transport error, got {:?}", other),
    }
}
