//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌───────────┬──────────┬─────────────────────────────┐
//! │ 0xC8 (1)  │  Op (1)  │      Op-specific body       │
//! └───────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Body by Command Type
//! - PUT / PUTKEEP: ksiz (4) + vsiz (4) + key + value
//! - OUT / GET:     ksiz (4) + key
//! - MGET:          rnum (4) + rnum × (ksiz (4) + key)
//! - ADDINT:        ksiz (4) + delta (4, signed) + key
//! - VANISH:        empty
//!
//! ### Response Format
//! ```text
//! ┌───────────┬─────────────────────────────────────────┐
//! │Status (1) │  Body (only when status is OK)          │
//! └───────────┴─────────────────────────────────────────┘
//! ```
//!
//! - GET:    vsiz (4) + value
//! - MGET:   rnum (4) + rnum × (ksiz (4) + vsiz (4) + key + value)
//! - ADDINT: sum (4, signed)
//!
//! All integers are big-endian.

use std::io::{Cursor, ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::{Command, CommandType, Response, ResponseBody, Status};
use crate::error::{CacheError, Result};

/// Leading byte of every request frame
pub const MAGIC: u8 = 0xC8;

/// Request header size: magic (1) + opcode (1)
pub const HEADER_SIZE: usize = 2;

/// Maximum size of a single key or value (16 MB)
pub const MAX_FIELD_SIZE: u32 = 16 * 1024 * 1024;

/// Maximum number of keys or records in one get-many frame
pub const MAX_RECORDS: u32 = 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Check a command against the field and record limits before it is sent
///
/// The decoder on the other end enforces the same limits, so a frame that
/// fails here would only get the connection dropped.
pub fn check_command(command: &Command) -> Result<()> {
    match command {
        Command::Put { key, value } | Command::PutIfAbsent { key, value } => {
            check_field("key", key)?;
            check_field("value", value)
        }
        Command::Remove { key } | Command::Get { key } | Command::Increment { key, .. } => {
            check_field("key", key)
        }
        Command::GetMany { keys } => {
            if keys.len() > MAX_RECORDS as usize {
                return Err(CacheError::Oversized(format!(
                    "{} keys (max {})",
                    keys.len(),
                    MAX_RECORDS
                )));
            }
            keys.iter().try_for_each(|key| check_field("key", key))
        }
        Command::Clear => Ok(()),
    }
}

fn check_field(field: &str, bytes: &[u8]) -> Result<()> {
    if bytes.len() > MAX_FIELD_SIZE as usize {
        return Err(CacheError::Oversized(format!(
            "{} is {} bytes (max {})",
            field,
            bytes.len(),
            MAX_FIELD_SIZE
        )));
    }
    Ok(())
}

/// Encode a command to bytes
///
/// Lengths are written as `u32`; run [`check_command`] first for input that
/// is not already known to be within limits.
pub fn encode_command(command: &Command) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body_size_hint(command));
    buf.put_u8(MAGIC);
    buf.put_u8(command.command_type() as u8);

    match command {
        Command::Put { key, value } | Command::PutIfAbsent { key, value } => {
            buf.put_u32(key.len() as u32);
            buf.put_u32(value.len() as u32);
            buf.put_slice(key);
            buf.put_slice(value);
        }
        Command::Remove { key } | Command::Get { key } => {
            buf.put_u32(key.len() as u32);
            buf.put_slice(key);
        }
        Command::GetMany { keys } => {
            buf.put_u32(keys.len() as u32);
            for key in keys {
                buf.put_u32(key.len() as u32);
                buf.put_slice(key);
            }
        }
        Command::Increment { key, delta } => {
            buf.put_u32(key.len() as u32);
            buf.put_i32(*delta);
            buf.put_slice(key);
        }
        Command::Clear => {}
    }

    buf.freeze()
}

fn body_size_hint(command: &Command) -> usize {
    match command {
        Command::Put { key, value } | Command::PutIfAbsent { key, value } => {
            8 + key.len() + value.len()
        }
        Command::Remove { key } | Command::Get { key } => 4 + key.len(),
        Command::GetMany { keys } => 4 + keys.iter().map(|k| 4 + k.len()).sum::<usize>(),
        Command::Increment { key, .. } => 8 + key.len(),
        Command::Clear => 0,
    }
}

/// Decode a command from a complete in-memory frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    decode_frame(bytes, "command", |cursor| read_command(cursor))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Refused responses carry only the status byte.
pub fn encode_response(response: &Response) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + body_len(&response.body));
    buf.put_u8(response.status as u8);

    if response.status == Status::Refused {
        return buf.freeze();
    }

    match &response.body {
        ResponseBody::Empty => {}
        ResponseBody::Value(value) => {
            buf.put_u32(value.len() as u32);
            buf.put_slice(value);
        }
        ResponseBody::Records(records) => {
            buf.put_u32(records.len() as u32);
            for (key, value) in records {
                buf.put_u32(key.len() as u32);
                buf.put_u32(value.len() as u32);
                buf.put_slice(key);
                buf.put_slice(value);
            }
        }
        ResponseBody::Number(n) => buf.put_i32(*n),
    }

    buf.freeze()
}

fn body_len(body: &ResponseBody) -> usize {
    match body {
        ResponseBody::Empty => 0,
        ResponseBody::Value(value) => 4 + value.len(),
        ResponseBody::Records(records) => {
            4 + records.iter().map(|(k, v)| 8 + k.len() + v.len()).sum::<usize>()
        }
        ResponseBody::Number(_) => 4,
    }
}

/// Decode a response to a command of the given type from a complete frame
pub fn decode_response(bytes: &[u8], kind: CommandType) -> Result<Response> {
    decode_frame(bytes, "response", |cursor| read_response(cursor, kind))
}

/// Run a stream decoder over an in-memory frame.
///
/// Running out of bytes here means the frame itself is short, which is a
/// protocol error rather than a transport one.
fn decode_frame<T>(
    bytes: &[u8],
    what: &str,
    decode: impl FnOnce(&mut Cursor<&[u8]>) -> Result<T>,
) -> Result<T> {
    let mut cursor = Cursor::new(bytes);
    let decoded = decode(&mut cursor).map_err(|e| match e {
        CacheError::Transport(ref io) if io.kind() == ErrorKind::UnexpectedEof => {
            CacheError::Protocol(format!("Incomplete {}: {} bytes", what, bytes.len()))
        }
        other => other,
    })?;

    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(CacheError::Protocol(format!(
            "Trailing bytes after {}: {} of {} consumed",
            what,
            consumed,
            bytes.len()
        )));
    }

    Ok(decoded)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    if header[0] != MAGIC {
        return Err(CacheError::Protocol(format!(
            "Unknown magic byte: 0x{:02x}",
            header[0]
        )));
    }

    let kind = CommandType::from_opcode(header[1]).ok_or_else(|| {
        CacheError::Protocol(format!("Unknown command type: 0x{:02x}", header[1]))
    })?;

    match kind {
        CommandType::Put | CommandType::PutIfAbsent => {
            let key_len = read_len(reader, "key")?;
            let value_len = read_len(reader, "value")?;
            let key = read_bytes(reader, key_len)?;
            let value = read_bytes(reader, value_len)?;
            if kind == CommandType::Put {
                Ok(Command::Put { key, value })
            } else {
                Ok(Command::PutIfAbsent { key, value })
            }
        }
        CommandType::Remove | CommandType::Get => {
            let key_len = read_len(reader, "key")?;
            let key = read_bytes(reader, key_len)?;
            if kind == CommandType::Remove {
                Ok(Command::Remove { key })
            } else {
                Ok(Command::Get { key })
            }
        }
        CommandType::GetMany => {
            let count = read_count(reader)?;
            let mut keys = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                let key_len = read_len(reader, "key")?;
                keys.push(read_bytes(reader, key_len)?);
            }
            Ok(Command::GetMany { keys })
        }
        CommandType::Increment => {
            let key_len = read_len(reader, "key")?;
            let delta = read_i32(reader)?;
            let key = read_bytes(reader, key_len)?;
            Ok(Command::Increment { key, delta })
        }
        CommandType::Clear => Ok(Command::Clear),
    }
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response to a command of the given type from a stream
pub fn read_response<R: Read>(reader: &mut R, kind: CommandType) -> Result<Response> {
    let status = match read_u8(reader)? {
        0x00 => Status::Ok,
        0x01 => Status::Refused,
        other => {
            return Err(CacheError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                other
            )))
        }
    };

    if status == Status::Refused {
        return Ok(Response::refused());
    }

    let body = match kind {
        CommandType::Get => {
            let value_len = read_len(reader, "value")?;
            ResponseBody::Value(read_bytes(reader, value_len)?)
        }
        CommandType::GetMany => {
            let count = read_count(reader)?;
            let mut records = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                let key_len = read_len(reader, "key")?;
                let value_len = read_len(reader, "value")?;
                let key = read_bytes(reader, key_len)?;
                let value = read_bytes(reader, value_len)?;
                records.push((key, value));
            }
            ResponseBody::Records(records)
        }
        CommandType::Increment => ResponseBody::Number(read_i32(reader)?),
        CommandType::Put | CommandType::PutIfAbsent | CommandType::Remove | CommandType::Clear => {
            ResponseBody::Empty
        }
    };

    Ok(Response { status, body })
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Field readers
// =============================================================================

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Read a key/value length prefix, rejecting oversized fields
fn read_len<R: Read>(reader: &mut R, field: &str) -> Result<usize> {
    let len = read_u32(reader)?;
    if len > MAX_FIELD_SIZE {
        return Err(CacheError::Protocol(format!(
            "{} too large: {} bytes (max {})",
            field, len, MAX_FIELD_SIZE
        )));
    }
    Ok(len as usize)
}

fn read_count<R: Read>(reader: &mut R) -> Result<usize> {
    let count = read_u32(reader)?;
    if count > MAX_RECORDS {
        return Err(CacheError::Protocol(format!(
            "Too many records: {} (max {})",
            count, MAX_RECORDS
        )));
    }
    Ok(count as usize)
}

fn read_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    if len > 0 {
        reader.read_exact(&mut buf)?;
    }
    Ok(buf)
}
