//! The RPC wire format: a 4-byte big-endian length prefix followed by
//! a `bincode`-encoded [`Request`]/[`Response`] payload, header then
//! body.
//!
//! This module only knows how to encode/decode payloads and frame
//! headers; the actual async/sync I/O loops live in the server and
//! client crates, which both depend on the header format defined
//! here staying in sync.

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};

pub const LEN_PREFIX_SIZE: usize = 4;

/// The maximum frame body size accepted, guarding against a corrupt or
/// malicious length prefix causing an unbounded allocation.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

pub fn len_prefix_bytes(len: u32) -> [u8; LEN_PREFIX_SIZE] {
    len.to_be_bytes()
}

pub fn parse_len_prefix(bytes: [u8; LEN_PREFIX_SIZE]) -> u32 {
    u32::from_be_bytes(bytes)
}

/// Serialize `value` and prefix it with its big-endian length.
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let body = bincode::serialize(value)?;
    let mut frame = Vec::with_capacity(LEN_PREFIX_SIZE + body.len());
    frame.extend_from_slice(&len_prefix_bytes(body.len() as u32));
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Deserialize a frame body (without the length prefix) into `T`.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(payload)?)
}

/// Block until one full frame has been read from `r`, returning its
/// body. Used by the synchronous RPC client.
pub fn read_frame_sync<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; LEN_PREFIX_SIZE];
    r.read_exact(&mut len_buf)?;
    let len = parse_len_prefix(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(Error::Protocol(format!("frame of {} bytes exceeds limit", len)));
    }
    let mut body = vec![0u8; len as usize];
    r.read_exact(&mut body)?;
    Ok(body)
}

/// Write one full frame (length prefix + body) to `w`.
pub fn write_frame_sync<W: Write>(w: &mut W, body: &[u8]) -> Result<()> {
    w.write_all(&len_prefix_bytes(body.len() as u32))?;
    w.write_all(body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Request;
    use std::io::Cursor;

    #[test]
    fn frame_round_trips_through_sync_io() {
        let req = Request::put(b"k".to_vec(), b"v".to_vec());
        let frame = encode_frame(&req).unwrap();
        let mut cursor = Cursor::new(frame);
        let body = read_frame_sync(&mut cursor).unwrap();
        let decoded: Request = decode_payload(&body).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut bytes = len_prefix_bytes(MAX_FRAME_BYTES + 1).to_vec();
        bytes.extend_from_slice(&[0u8; 8]);
        let mut cursor = Cursor::new(bytes);
        assert!(read_frame_sync(&mut cursor).is_err());
    }
}
