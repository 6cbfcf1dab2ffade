//! The tokio-driven binary RPC server.
//!
//! Each accepted connection is handled by its own task that loops:
//! read one framed request (the task's CREATE state, waiting for the
//! next call), dispatch it on the shared worker pool (PROCESS), write
//! the framed response (FINISH), then loop back to CREATE. Because
//! `tokio::net::TcpListener::accept` is called again the instant a
//! connection is handed off, there is always an acceptor in CREATE
//! state for new connections, and each connection's own loop is
//! always in CREATE state for its next request the moment the
//! previous one finishes — the self-replicating acceptor invariant
//! without needing to hand-roll a completion queue.

use kvd_core::handler::dispatch;
use kvd_core::model::{Request, Response};
use kvd_core::protocol::rpc::{decode_payload, encode_frame, parse_len_prefix, LEN_PREFIX_SIZE, MAX_FRAME_BYTES};
use kvd_core::storage::Storage;
use kvd_core::threadpool::ThreadPool;
use kvd_core::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

pub struct RpcServer {
    addr: SocketAddr,
    storage: Arc<dyn Storage>,
    workers: usize,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, storage: Arc<dyn Storage>, workers: usize) -> Self {
        Self { addr, storage, workers }
    }

    /// Run until `shutdown` resolves. Stops accepting new connections,
    /// waits for every in-flight connection task to finish its current
    /// call, persists the storage engine, and returns.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        let mut pool = ThreadPool::new();
        pool.start(self.workers);
        let pool = Arc::new(pool);
        let storage = self.storage;
        let mut tasks = JoinSet::new();

        log::info!("rpc server listening on {}", self.addr);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((socket, peer)) => {
                            log::debug!("CREATE: accepted connection from {}", peer);
                            let storage = Arc::clone(&storage);
                            let pool = Arc::clone(&pool);
                            tasks.spawn(async move {
                                if let Err(err) = handle_connection(socket, storage, pool).await {
                                    log::debug!("connection from {} closed: {}", peer, err);
                                }
                            });
                        }
                        Err(err) => log::error!("accept error: {}", err),
                    }
                }
                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(err) = res {
                        log::error!("connection task panicked: {}", err);
                    }
                }
                _ = &mut shutdown => {
                    log::info!("rpc server received shutdown signal, draining {} connection(s)", tasks.len());
                    break;
                }
            }
        }

        while let Some(res) = tasks.join_next().await {
            if let Err(err) = res {
                log::error!("connection task panicked: {}", err);
            }
        }

        log::info!("persisting storage before shutdown");
        storage.persist()?;
        log::info!("storage persisted, exiting");
        Ok(())
    }
}

async fn handle_connection(mut socket: TcpStream, storage: Arc<dyn Storage>, pool: Arc<ThreadPool>) -> Result<()> {
    loop {
        let req = match read_request(&mut socket).await {
            Ok(req) => req,
            Err(_) => return Ok(()), // peer closed the connection
        };
        log::debug!("PROCESS: dispatching {:?}", req.op);

        let (tx, rx) = oneshot::channel();
        let storage_for_task = Arc::clone(&storage);
        pool.post(move || {
            let resp = dispatch(&req, storage_for_task.as_ref());
            let _ = tx.send(resp);
        });
        let resp: Response = rx.await.map_err(|_| Error::Protocol("handler task dropped its response".to_string()))?;

        write_response(&mut socket, &resp).await?;
        log::debug!("FINISH: response sent");
    }
}

async fn read_request(socket: &mut TcpStream) -> Result<Request> {
    let mut len_buf = [0u8; LEN_PREFIX_SIZE];
    socket.read_exact(&mut len_buf).await?;
    let len = parse_len_prefix(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(Error::Protocol(format!("frame of {} bytes exceeds limit", len)));
    }
    let mut body = vec![0u8; len as usize];
    socket.read_exact(&mut body).await?;
    decode_payload(&body)
}

async fn write_response(socket: &mut TcpStream, resp: &Response) -> Result<()> {
    let frame = encode_frame(resp)?;
    socket.write_all(&frame).await?;
    Ok(())
}
