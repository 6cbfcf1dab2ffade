//! A tokio-backed [`Connection`] for the kvd async RPC client.

use async_trait::async_trait;
use kvd_client_core::error::Error;
use kvd_client_core::rpc::Connection;
use kvd_client_core::Result;
use std::ops::DerefMut;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

pub use kvd_client_core::rpc::Client;

/// The tokio-flavored [`Client`] alias, for callers that don't want to
/// spell out the connection type parameter.
pub type TokioClient = Client<TokioConnection>;

/// A connection to a kvd RPC server driven by the tokio runtime. Clone
/// to share the same socket between callers; reads and writes are
/// serialized through an internal mutex.
#[derive(Clone)]
pub struct TokioConnection {
    stream: Arc<Mutex<TcpStream>>,
}

#[async_trait]
impl Connection for TokioConnection {
    async fn connect(addr: String) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(Error::Io)?;
        Ok(Self {
            stream: Arc::new(Mutex::new(stream)),
        })
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut lock = self.stream.lock().await;
        lock.deref_mut().read_exact(buf).await.map_err(Error::Io)?;
        Ok(())
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut lock = self.stream.lock().await;
        lock.deref_mut().write_all(buf).await.map_err(Error::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvd_core::handler::dispatch;
    use kvd_core::protocol::rpc::{decode_payload, encode_frame, parse_len_prefix, LEN_PREFIX_SIZE};
    use kvd_core::storage::{build_storage, StorageKind};
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn round_trips_a_put_and_a_get() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let storage = build_storage(&StorageKind::Memory).unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            for _ in 0..2 {
                let mut len_buf = [0u8; LEN_PREFIX_SIZE];
                socket.read_exact(&mut len_buf).await.unwrap();
                let len = parse_len_prefix(len_buf);
                let mut body = vec![0u8; len as usize];
                socket.read_exact(&mut body).await.unwrap();
                let req = decode_payload(&body).unwrap();
                let resp = dispatch(&req, storage.as_ref());
                let frame = encode_frame(&resp).unwrap();
                socket.write_all(&frame).await.unwrap();
            }
        });

        let mut client: TokioClient = Client::connect(addr.to_string()).await.unwrap();
        assert!(client.put(b"k1".to_vec(), b"v1".to_vec()).await.unwrap());
        let (ok, value) = client.get(b"k1".to_vec()).await.unwrap();
        assert!(ok);
        assert_eq!(value, b"v1".to_vec());
    }
}
