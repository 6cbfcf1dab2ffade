//! The epoll-driven (via `mio`) line-protocol server. One event-loop
//! thread owns the listener and every client socket; handlers run
//! synchronously against the shared storage engine from that same
//! thread, so there is no per-connection thread and no handler-side
//! locking beyond what the storage engine itself does.

use kvd_core::handler::dispatch;
use kvd_core::model::{Response, MSG_FAIL, MSG_UNKNOWN_OPERATION};
use kvd_core::protocol::line::{decode_request, encode_response, DecodeError, LineFramer};
use kvd_core::storage::Storage;
use kvd_core::{Error, Result};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CLIENT_TOKEN: usize = 2;
const READ_CHUNK: usize = 4096;
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

struct ClientConn {
    stream: TcpStream,
    framer: LineFramer,
}

/// A handle used to request shutdown of a running [`LineServer`] from
/// another thread.
#[derive(Clone)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.waker.wake();
    }
}

/// The line-protocol TCP server. Construct with [`LineServer::bind`],
/// then call [`LineServer::run`] to drive the event loop until
/// [`StopHandle::stop`] is called from another thread.
pub struct LineServer {
    poll: Poll,
    listener: TcpListener,
    storage: Arc<dyn Storage>,
    stop: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl LineServer {
    pub fn bind(addr: SocketAddr, storage: Arc<dyn Storage>) -> Result<Self> {
        let mut listener = TcpListener::bind(addr)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);
        Ok(Self {
            poll,
            listener,
            storage,
            stop: Arc::new(AtomicBool::new(false)),
            waker,
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop: Arc::clone(&self.stop),
            waker: Arc::clone(&self.waker),
        }
    }

    /// Run the event loop until stopped. Blocks the calling thread.
    pub fn run(mut self) -> Result<()> {
        let mut events = Events::with_capacity(1024);
        let mut connections: HashMap<Token, ClientConn> = HashMap::new();
        let mut next_token = FIRST_CLIENT_TOKEN;

        loop {
            self.poll.poll(&mut events, Some(POLL_TIMEOUT))?;

            for event in events.iter() {
                match event.token() {
                    WAKER => {}
                    LISTENER => self.accept_loop(&mut connections, &mut next_token),
                    token => {
                        let close = match connections.get_mut(&token) {
                            Some(conn) => handle_readable(conn, self.storage.as_ref()),
                            None => false,
                        };
                        if close {
                            if let Some(mut conn) = connections.remove(&token) {
                                let _ = self.poll.registry().deregister(&mut conn.stream);
                                log::info!("closed connection {:?}", token);
                            }
                        }
                    }
                }
            }

            if self.stop.load(Ordering::SeqCst) {
                for (_, mut conn) in connections.drain() {
                    let _ = self.poll.registry().deregister(&mut conn.stream);
                }
                log::info!("persisting storage before shutdown");
                self.storage.persist()?;
                log::info!("storage persisted, exiting");
                return Ok(());
            }
        }
    }

    fn accept_loop(&mut self, connections: &mut HashMap<Token, ClientConn>, next_token: &mut usize) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    log::info!("accepted connection from {}", peer);
                    let token = Token(*next_token);
                    *next_token += 1;
                    if self
                        .poll
                        .registry()
                        .register(&mut stream, token, Interest::READABLE)
                        .is_ok()
                    {
                        connections.insert(
                            token,
                            ClientConn {
                                stream,
                                framer: LineFramer::new(),
                            },
                        );
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return,
                Err(err) => {
                    log::error!("accept error: {}", err);
                    return;
                }
            }
        }
    }
}

/// Drain readable bytes from `conn`, dispatch every complete line, and
/// write back responses. Returns `true` if the connection should be
/// closed (EOF or a non-retryable error).
fn handle_readable(conn: &mut ClientConn, storage: &dyn Storage) -> bool {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match conn.stream.read(&mut buf) {
            Ok(0) => return true,
            Ok(n) => conn.framer.push(&buf[..n]),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
            Err(err) => {
                log::error!("read error: {}", err);
                return true;
            }
        }
    }

    while let Some(line) = conn.framer.next_line() {
        let response = match decode_request(&line) {
            Ok(req) => dispatch(&req, storage),
            Err(DecodeError::UnknownVerb) => {
                log::warn!("unknown verb in request");
                Response::fail(MSG_UNKNOWN_OPERATION)
            }
            Err(DecodeError::Malformed(reason)) => {
                log::warn!("malformed request: {}", reason);
                Response::fail(MSG_FAIL)
            }
        };
        let encoded = encode_response(&response);
        if write_all_retrying(&mut conn.stream, &encoded).is_err() {
            return true;
        }
    }
    false
}

/// Write `data` in full, retrying on `WouldBlock`. The socket is
/// edge-triggered for read readiness only, so a short spin here is
/// simpler than registering for write readiness for what are always
/// small responses.
fn write_all_retrying(stream: &mut TcpStream, data: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < data.len() {
        match stream.write(&data[written..]) {
            Ok(0) => return Err(Error::Protocol("connection closed mid-write".to_string())),
            Ok(n) => written += n,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                std::thread::yield_now();
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
