//! The async RPC client. [`Connection`] abstracts over the async
//! runtime so this module can be shared by every runtime-specific
//! adapter crate; [`Client`] implements the request/response calls on
//! top of it, and [`CallbackClient`] adapts those `async` calls to a
//! plain callback interface for callers that don't want to depend on
//! an async runtime at all.

use crate::error::{Error, Result};
use async_trait::async_trait;
use kvd_core::model::{Kv, Request, Response};
use kvd_core::protocol::rpc::{decode_payload, encode_frame, parse_len_prefix, LEN_PREFIX_SIZE, MAX_FRAME_BYTES};
use std::sync::mpsc;
use std::thread;

/// A connection to a kvd RPC server, generic over the async runtime
/// used to drive it.
#[async_trait]
pub trait Connection: Send + Sync + Sized + 'static {
    async fn connect(addr: String) -> Result<Self>;
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;
    async fn write_all(&mut self, buf: &[u8]) -> Result<()>;
}

/// An async client over a generic [`Connection`]. One instance serves
/// one TCP connection; callers that want concurrency should pool
/// several.
pub struct Client<C: Connection> {
    conn: C,
}

impl<C: Connection> Client<C> {
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        let conn = C::connect(addr.into()).await?;
        Ok(Self { conn })
    }

    async fn call(&mut self, req: &Request) -> Result<Response> {
        let frame = encode_frame(req)?;
        self.conn.write_all(&frame).await?;

        let mut len_buf = [0u8; LEN_PREFIX_SIZE];
        self.conn.read_exact(&mut len_buf).await?;
        let len = parse_len_prefix(len_buf);
        if len > MAX_FRAME_BYTES {
            return Err(Error::Protocol(format!("frame of {} bytes exceeds limit", len)));
        }
        let mut body = vec![0u8; len as usize];
        self.conn.read_exact(&mut body).await?;
        Ok(decode_payload(&body)?)
    }

    pub async fn get(&mut self, key: impl Into<Vec<u8>>) -> Result<(bool, Vec<u8>)> {
        let resp = self.call(&Request::get(key.into())).await?;
        Ok((resp.success, resp.value.unwrap_or_default()))
    }

    pub async fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Result<bool> {
        let resp = self.call(&Request::put(key.into(), value.into())).await?;
        Ok(resp.success)
    }

    pub async fn delete(&mut self, key: impl Into<Vec<u8>>) -> Result<bool> {
        let resp = self.call(&Request::delete(key.into())).await?;
        Ok(resp.success)
    }

    pub async fn multi_get(&mut self, keys: Vec<Vec<u8>>) -> Result<Vec<Kv>> {
        let resp = self.call(&Request::multi_get(keys)).await?;
        Ok(resp.kvs)
    }

    pub async fn multi_put(&mut self, kvs: Vec<Kv>) -> Result<bool> {
        let resp = self.call(&Request::multi_put(kvs)).await?;
        Ok(resp.success)
    }

    pub async fn multi_delete(&mut self, keys: Vec<Vec<u8>>) -> Result<bool> {
        let resp = self.call(&Request::multi_delete(keys)).await?;
        Ok(resp.success)
    }
}

type Job<C> = Box<dyn FnOnce(&mut Client<C>) + Send>;

/// Wraps an async [`Client`] with a background thread so callers that
/// have no async runtime of their own can still issue requests, via a
/// plain callback invoked once the response arrives.
///
/// The background thread owns the `Client<C>` outright and drains a
/// queue of jobs, each running one client method to completion with
/// `futures::executor::block_on` before invoking its callback. Calls
/// from different caller threads are serialized onto the one
/// connection, same as a single synchronous client would be.
pub struct CallbackClient<C: Connection> {
    tx: mpsc::Sender<Job<C>>,
}

impl<C: Connection> CallbackClient<C> {
    pub fn new(mut client: Client<C>) -> Self {
        let (tx, rx) = mpsc::channel::<Job<C>>();
        thread::spawn(move || {
            for job in rx {
                job(&mut client);
            }
        });
        Self { tx }
    }

    fn submit(&self, job: Job<C>) {
        let _ = self.tx.send(job);
    }

    pub fn get(&self, key: impl Into<Vec<u8>>, callback: impl FnOnce(Result<(bool, Vec<u8>)>) + Send + 'static) {
        let key = key.into();
        self.submit(Box::new(move |client| {
            callback(futures::executor::block_on(client.get(key)));
        }));
    }

    pub fn put(
        &self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        callback: impl FnOnce(Result<bool>) + Send + 'static,
    ) {
        let (key, value) = (key.into(), value.into());
        self.submit(Box::new(move |client| {
            callback(futures::executor::block_on(client.put(key, value)));
        }));
    }

    pub fn delete(&self, key: impl Into<Vec<u8>>, callback: impl FnOnce(Result<bool>) + Send + 'static) {
        let key = key.into();
        self.submit(Box::new(move |client| {
            callback(futures::executor::block_on(client.delete(key)));
        }));
    }

    pub fn multi_get(&self, keys: Vec<Vec<u8>>, callback: impl FnOnce(Result<Vec<Kv>>) + Send + 'static) {
        self.submit(Box::new(move |client| {
            callback(futures::executor::block_on(client.multi_get(keys)));
        }));
    }

    pub fn multi_put(&self, kvs: Vec<Kv>, callback: impl FnOnce(Result<bool>) + Send + 'static) {
        self.submit(Box::new(move |client| {
            callback(futures::executor::block_on(client.multi_put(kvs)));
        }));
    }

    pub fn multi_delete(&self, keys: Vec<Vec<u8>>, callback: impl FnOnce(Result<bool>) + Send + 'static) {
        self.submit(Box::new(move |client| {
            callback(futures::executor::block_on(client.multi_delete(keys)));
        }));
    }
}
