//! Protocol Module
//!
//! Defines the wire protocol spoken with the store. The frame layout is the
//! Tokyo Tyrant binary protocol, so the client interoperates with `ttserver`.
//!
//! ### Commands
//! - 0x10: PUT      - overwrite
//! - 0x11: PUTKEEP  - put if absent
//! - 0x20: OUT      - remove
//! - 0x30: GET
//! - 0x31: MGET     - get many
//! - 0x60: ADDINT   - increment
//! - 0x72: VANISH   - clear
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: REFUSED (not found / already exists / not a counter)

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, ResponseBody, Status};
pub use codec::{
    check_command, decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAGIC, MAX_FIELD_SIZE,
    MAX_RECORDS,
};
