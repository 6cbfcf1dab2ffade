//! An epoll-driven (via `mio`) TCP server speaking the kvd line
//! protocol.

mod server;

pub use server::{LineServer, StopHandle};
