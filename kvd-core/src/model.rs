//! The request/response domain model shared by both servers and both
//! client variants. Values are opaque byte strings; everything in this
//! module is wire-format agnostic.

use serde::{Deserialize, Serialize};

pub const MSG_SUCCESS: &str = "success";
pub const MSG_FAIL: &str = "fail";
pub const MSG_KEY_NOT_FOUND: &str = "key not found";
pub const MSG_UNKNOWN_OPERATION: &str = "unknown operation";
pub const MSG_PARTIAL_FAILURE: &str = "partial failure";

/// The kind of operation a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Get,
    Put,
    Delete,
    MultiGet,
    MultiPut,
    MultiDelete,
    Invalid,
}

/// A single key/value pair, used by the multi-key request and response
/// variants. `value` is ignored by MultiGet/MultiDelete requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kv {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Kv {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub op: Op,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub kvs: Vec<Kv>,
}

impl Request {
    pub fn get(key: impl Into<Vec<u8>>) -> Self {
        Self {
            op: Op::Get,
            key: key.into(),
            value: Vec::new(),
            kvs: Vec::new(),
        }
    }

    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            op: Op::Put,
            key: key.into(),
            value: value.into(),
            kvs: Vec::new(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self {
            op: Op::Delete,
            key: key.into(),
            value: Vec::new(),
            kvs: Vec::new(),
        }
    }

    pub fn multi_get(keys: Vec<Vec<u8>>) -> Self {
        Self {
            op: Op::MultiGet,
            key: Vec::new(),
            value: Vec::new(),
            kvs: keys.into_iter().map(|k| Kv::new(k, Vec::new())).collect(),
        }
    }

    pub fn multi_put(kvs: Vec<Kv>) -> Self {
        Self {
            op: Op::MultiPut,
            key: Vec::new(),
            value: Vec::new(),
            kvs,
        }
    }

    pub fn multi_delete(keys: Vec<Vec<u8>>) -> Self {
        Self {
            op: Op::MultiDelete,
            key: Vec::new(),
            value: Vec::new(),
            kvs: keys.into_iter().map(|k| Kv::new(k, Vec::new())).collect(),
        }
    }

    pub fn invalid() -> Self {
        Self {
            op: Op::Invalid,
            key: Vec::new(),
            value: Vec::new(),
            kvs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
    pub value: Option<Vec<u8>>,
    pub kvs: Vec<Kv>,
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            value: None,
            kvs: Vec::new(),
        }
    }

    pub fn ok_value(message: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            success: true,
            message: message.into(),
            value: Some(value),
            kvs: Vec::new(),
        }
    }

    pub fn ok_kvs(message: impl Into<String>, kvs: Vec<Kv>) -> Self {
        Self {
            success: true,
            message: message.into(),
            value: None,
            kvs,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            value: None,
            kvs: Vec::new(),
        }
    }
}
