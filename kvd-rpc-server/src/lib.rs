//! A tokio-driven binary RPC server speaking the kvd length-prefixed
//! `bincode` wire protocol.

mod server;

pub use server::RpcServer;
