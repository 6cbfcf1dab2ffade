//! Runtime-agnostic client for the kvd key/value service.
//!
//! Two client surfaces are provided: [`line::LineClient`], a blocking
//! client for the line protocol over `std::net::TcpStream`, and the
//! [`rpc::Connection`]/[`rpc::Client`] pair, an async client for the
//! binary RPC protocol that leaves the runtime (tokio, async-std, ...)
//! to a separate adapter crate. [`rpc::CallbackClient`] wraps the
//! latter in a plain callback interface for synchronous callers.

pub mod error;
pub mod line;
pub mod rpc;

pub use error::{Error, Result};
pub use line::LineClient;
pub use rpc::{CallbackClient, Client, Connection};
