//! A synchronous client for the line-protocol server, used by tests
//! and benchmarks. Appends `\r\n` to every request and accumulates
//! reads until a full response line has arrived.

use crate::error::{Error, Result};
use kvd_core::model::{Kv, Request, Response};
use kvd_core::protocol::line::{decode_response, encode_request, LineFramer};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

pub struct LineClient {
    stream: TcpStream,
    framer: LineFramer,
    last_error: Option<Error>,
}

impl LineClient {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self {
            stream,
            framer: LineFramer::new(),
            last_error: None,
        })
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    fn call(&mut self, req: &Request) -> Result<Response> {
        let result = self.call_inner(req);
        if let Err(err) = &result {
            self.last_error = Some(clone_error(err));
        }
        result
    }

    fn call_inner(&mut self, req: &Request) -> Result<Response> {
        let line = encode_request(req);
        self.stream.write_all(&line)?;

        loop {
            if let Some(line) = self.framer.next_line() {
                return decode_response(&line)
                    .map_err(|err| Error::Protocol(format!("{:?}", err)));
            }
            let mut buf = [0u8; 4096];
            let n = self.stream.read(&mut buf)?;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed before a full response arrived",
                )));
            }
            self.framer.push(&buf[..n]);
        }
    }

    pub fn get(&mut self, key: impl Into<Vec<u8>>) -> Result<(bool, Vec<u8>)> {
        let resp = self.call(&Request::get(key.into()))?;
        Ok((resp.success, resp.value.unwrap_or_default()))
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Result<bool> {
        let resp = self.call(&Request::put(key.into(), value.into()))?;
        Ok(resp.success)
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) -> Result<bool> {
        let resp = self.call(&Request::delete(key.into()))?;
        Ok(resp.success)
    }

    pub fn multi_get(&mut self, keys: Vec<Vec<u8>>) -> Result<Vec<Kv>> {
        let resp = self.call(&Request::multi_get(keys))?;
        Ok(resp.kvs)
    }

    pub fn multi_put(&mut self, kvs: Vec<Kv>) -> Result<bool> {
        let resp = self.call(&Request::multi_put(kvs))?;
        Ok(resp.success)
    }

    pub fn multi_delete(&mut self, keys: Vec<Vec<u8>>) -> Result<bool> {
        let resp = self.call(&Request::multi_delete(keys))?;
        Ok(resp.success)
    }
}

fn clone_error(err: &Error) -> Error {
    match err {
        Error::Io(io_err) => Error::Io(std::io::Error::new(io_err.kind(), io_err.to_string())),
        Error::Protocol(msg) => Error::Protocol(msg.clone()),
        Error::Core(_) => Error::Protocol(err.to_string()),
    }
}
