//! The line protocol: one `\r\n`-terminated ASCII line per request or
//! response, tokens separated by single spaces. Tokenization is
//! whitespace-naive and cannot carry embedded spaces or binary
//! payloads — a known limitation, not a bug (see `DESIGN.md`).

use crate::model::{Kv, Op, Request, Response};

const TERMINATOR: &str = "\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The verb token is not one of GET/PUT/DEL/MGET/MPUT/MDEL.
    UnknownVerb,
    /// A recognized verb had the wrong number/shape of arguments.
    Malformed(String),
}

/// Accumulates bytes received from a socket and yields one complete
/// line at a time, stripped of its `\r\n` terminator. Bytes that do
/// not yet form a complete line remain buffered for the next push.
#[derive(Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete `\r\n`-terminated line, if one is
    /// present. Call repeatedly after each `push` to drain every
    /// message that arrived, since a single read may contain several.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.windows(2).position(|w| w == b"\r\n")?;
        let line = self.buf[..pos].to_vec();
        self.buf.drain(..pos + 2);
        Some(line)
    }
}

fn tokenize(line: &[u8]) -> Vec<&[u8]> {
    line.split(|&b| b == b' ').filter(|t| !t.is_empty()).collect()
}

/// Parse one already-unframed line into a [`Request`].
pub fn decode_request(line: &[u8]) -> Result<Request, DecodeError> {
    let tokens = tokenize(line);
    let Some((verb, args)) = tokens.split_first() else {
        return Err(DecodeError::Malformed("empty request".to_string()));
    };

    match *verb {
        b"GET" => {
            let [key] = args else {
                return Err(DecodeError::Malformed("GET takes exactly one key".to_string()));
            };
            Ok(Request::get(key.to_vec()))
        }
        b"PUT" => {
            let [key, value] = args else {
                return Err(DecodeError::Malformed("PUT requires a key and a value".to_string()));
            };
            Ok(Request::put(key.to_vec(), value.to_vec()))
        }
        b"DEL" => {
            let [key] = args else {
                return Err(DecodeError::Malformed("DEL takes exactly one key".to_string()));
            };
            Ok(Request::delete(key.to_vec()))
        }
        b"MGET" => {
            if args.is_empty() {
                return Err(DecodeError::Malformed("MGET requires at least one key".to_string()));
            }
            Ok(Request::multi_get(args.iter().map(|k| k.to_vec()).collect()))
        }
        b"MPUT" => {
            if args.is_empty() || args.len() % 2 != 0 {
                return Err(DecodeError::Malformed(
                    "MPUT requires an even number of key/value tokens".to_string(),
                ));
            }
            let kvs = args
                .chunks(2)
                .map(|pair| Kv::new(pair[0].to_vec(), pair[1].to_vec()))
                .collect();
            Ok(Request::multi_put(kvs))
        }
        b"MDEL" => {
            if args.is_empty() {
                return Err(DecodeError::Malformed("MDEL requires at least one key".to_string()));
            }
            Ok(Request::multi_delete(args.iter().map(|k| k.to_vec()).collect()))
        }
        _ => Err(DecodeError::UnknownVerb),
    }
}

/// Encode a [`Request`] as a line for the client side of the wire.
pub fn encode_request(req: &Request) -> Vec<u8> {
    let mut out = Vec::new();
    match req.op {
        Op::Get => {
            out.extend_from_slice(b"GET ");
            out.extend_from_slice(&req.key);
        }
        Op::Put => {
            out.extend_from_slice(b"PUT ");
            out.extend_from_slice(&req.key);
            out.push(b' ');
            out.extend_from_slice(&req.value);
        }
        Op::Delete => {
            out.extend_from_slice(b"DEL ");
            out.extend_from_slice(&req.key);
        }
        Op::MultiGet => {
            out.extend_from_slice(b"MGET");
            for kv in &req.kvs {
                out.push(b' ');
                out.extend_from_slice(&kv.key);
            }
        }
        Op::MultiPut => {
            out.extend_from_slice(b"MPUT");
            for kv in &req.kvs {
                out.push(b' ');
                out.extend_from_slice(&kv.key);
                out.push(b' ');
                out.extend_from_slice(&kv.value);
            }
        }
        Op::MultiDelete => {
            out.extend_from_slice(b"MDEL");
            for kv in &req.kvs {
                out.push(b' ');
                out.extend_from_slice(&kv.key);
            }
        }
        Op::Invalid => {}
    }
    out.extend_from_slice(TERMINATOR.as_bytes());
    out
}

/// Encode a [`Response`] as `SUCCESS <message> [...]` or
/// `FAIL <message>`, terminated with `\r\n`.
pub fn encode_response(resp: &Response) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(if resp.success { b"SUCCESS" } else { b"FAIL" });
    out.push(b' ');
    out.extend_from_slice(resp.message.as_bytes());
    if let Some(value) = &resp.value {
        out.push(b' ');
        out.extend_from_slice(value);
    }
    for kv in &resp.kvs {
        out.push(b' ');
        out.extend_from_slice(&kv.key);
        out.push(b' ');
        out.extend_from_slice(&kv.value);
    }
    out.extend_from_slice(TERMINATOR.as_bytes());
    out
}

/// Parse a response line as produced by [`encode_response`]. Used by
/// the synchronous client.
pub fn decode_response(line: &[u8]) -> Result<Response, DecodeError> {
    let tokens = tokenize(line);
    let Some((status, rest)) = tokens.split_first() else {
        return Err(DecodeError::Malformed("empty response".to_string()));
    };
    let success = match *status {
        b"SUCCESS" => true,
        b"FAIL" => false,
        _ => return Err(DecodeError::Malformed("unrecognized status token".to_string())),
    };
    let Some((message, rest)) = rest.split_first() else {
        return Err(DecodeError::Malformed("response missing message".to_string()));
    };
    let message = String::from_utf8_lossy(message).into_owned();

    let mut resp = if success {
        Response::ok(message)
    } else {
        Response::fail(message)
    };

    if success && rest.len() == 1 {
        resp.value = Some(rest[0].to_vec());
    } else if success && !rest.is_empty() && rest.len() % 2 == 0 {
        resp.kvs = rest
            .chunks(2)
            .map(|pair| Kv::new(pair[0].to_vec(), pair[1].to_vec()))
            .collect();
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framer_yields_one_line_per_terminator() {
        let mut framer = LineFramer::new();
        framer.push(b"GET k1\r\nGET k2\r\n");
        assert_eq!(framer.next_line(), Some(b"GET k1".to_vec()));
        assert_eq!(framer.next_line(), Some(b"GET k2".to_vec()));
        assert_eq!(framer.next_line(), None);
    }

    #[test]
    fn framer_handles_fragmented_reads() {
        let mut framer = LineFramer::new();
        framer.push(b"GE");
        assert_eq!(framer.next_line(), None);
        framer.push(b"T k1\r");
        assert_eq!(framer.next_line(), None);
        framer.push(b"\nGET k2\r\n");
        assert_eq!(framer.next_line(), Some(b"GET k1".to_vec()));
        assert_eq!(framer.next_line(), Some(b"GET k2".to_vec()));
    }

    #[test]
    fn decodes_get_put_del() {
        assert_eq!(decode_request(b"GET k1").unwrap(), Request::get(b"k1".to_vec()));
        assert_eq!(
            decode_request(b"PUT k1 v1").unwrap(),
            Request::put(b"k1".to_vec(), b"v1".to_vec())
        );
        assert_eq!(decode_request(b"DEL k1").unwrap(), Request::delete(b"k1".to_vec()));
    }

    #[test]
    fn put_without_value_is_malformed() {
        assert_eq!(decode_request(b"PUT k1"), Err(DecodeError::Malformed("PUT requires a key and a value".to_string())));
    }

    #[test]
    fn unknown_verb_is_reported_distinctly() {
        assert_eq!(decode_request(b"FROB k1"), Err(DecodeError::UnknownVerb));
    }

    #[test]
    fn decodes_multi_ops() {
        let req = decode_request(b"MGET a b c").unwrap();
        assert_eq!(req.op, Op::MultiGet);
        assert_eq!(req.kvs.len(), 3);

        let req = decode_request(b"MPUT a 1 b 2").unwrap();
        assert_eq!(req.op, Op::MultiPut);
        assert_eq!(req.kvs, vec![Kv::new(b"a".to_vec(), b"1".to_vec()), Kv::new(b"b".to_vec(), b"2".to_vec())]);
    }

    #[test]
    fn encode_decode_response_round_trips_for_get() {
        let resp = Response::ok_value("success", b"v1".to_vec());
        let encoded = encode_response(&resp);
        assert_eq!(encoded, b"SUCCESS success v1\r\n");
        let decoded = decode_response(&encoded[..encoded.len() - 2]).unwrap();
        assert_eq!(decoded.value, Some(b"v1".to_vec()));
    }

    #[test]
    fn encode_decode_response_round_trips_for_fail() {
        let resp = Response::fail("key not found");
        let encoded = encode_response(&resp);
        assert_eq!(encoded, b"FAIL key not found\r\n");
    }
}
