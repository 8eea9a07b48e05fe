//! Response definitions
//!
//! Responses are not self-describing on the wire: the shape of the body
//! depends on which command was sent.

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// The operation succeeded
    Ok = 0x00,

    /// The operation's expected failure: key missing (get/remove), key
    /// already present (put-if-absent), or stored value not a counter
    /// (increment)
    Refused = 0x01,
}

/// Body carried by a successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// put, put-if-absent, remove, clear, and every refused response
    Empty,

    /// get
    Value(Vec<u8>),

    /// get-many: found (key, value) pairs in server order
    Records(Vec<(Vec<u8>, Vec<u8>)>),

    /// increment: the new counter value
    Number(i32),
}

/// A response frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Body (always `Empty` when refused)
    pub body: ResponseBody,
}

impl Response {
    /// A successful response without a body
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            body: ResponseBody::Empty,
        }
    }

    /// A successful get response
    pub fn value(value: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            body: ResponseBody::Value(value),
        }
    }

    /// A successful get-many response
    pub fn records(records: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            status: Status::Ok,
            body: ResponseBody::Records(records),
        }
    }

    /// A successful increment response
    pub fn number(n: i32) -> Self {
        Self {
            status: Status::Ok,
            body: ResponseBody::Number(n),
        }
    }

    /// A refused response
    pub fn refused() -> Self {
        Self {
            status: Status::Refused,
            body: ResponseBody::Empty,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
