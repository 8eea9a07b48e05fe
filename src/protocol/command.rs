//! Command definitions
//!
//! Represents requests sent to the store.

/// Command opcodes (the byte following the magic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    Put = 0x10,
    PutIfAbsent = 0x11,
    Remove = 0x20,
    Get = 0x30,
    GetMany = 0x31,
    Increment = 0x60,
    Clear = 0x72,
}

impl CommandType {
    /// Map an opcode byte back to its command type
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            0x10 => Some(CommandType::Put),
            0x11 => Some(CommandType::PutIfAbsent),
            0x20 => Some(CommandType::Remove),
            0x30 => Some(CommandType::Get),
            0x31 => Some(CommandType::GetMany),
            0x60 => Some(CommandType::Increment),
            0x72 => Some(CommandType::Clear),
            _ => None,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            CommandType::Put => "put",
            CommandType::PutIfAbsent => "put_if_absent",
            CommandType::Remove => "remove",
            CommandType::Get => "get",
            CommandType::GetMany => "get_many",
            CommandType::Increment => "increment",
            CommandType::Clear => "clear",
        }
    }
}

/// A request frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Unconditionally store a value
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Store a value only if the key is absent
    PutIfAbsent { key: Vec<u8>, value: Vec<u8> },

    /// Remove a key
    Remove { key: Vec<u8> },

    /// Get a value by key
    Get { key: Vec<u8> },

    /// Get several values; missing keys are omitted from the response
    GetMany { keys: Vec<Vec<u8>> },

    /// Atomically add a signed delta to a stored counter
    Increment { key: Vec<u8>, delta: i32 },

    /// Drop every key
    Clear,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Put { .. } => CommandType::Put,
            Command::PutIfAbsent { .. } => CommandType::PutIfAbsent,
            Command::Remove { .. } => CommandType::Remove,
            Command::Get { .. } => CommandType::Get,
            Command::GetMany { .. } => CommandType::GetMany,
            Command::Increment { .. } => CommandType::Increment,
            Command::Clear => CommandType::Clear,
        }
    }
}
